//! Adapter lookup by URL host.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use savor_core::Error;
use url::Url;

use super::adapter::Adapter;

/// The set of adapters loaded for a run.
#[derive(Debug, Default, Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<Adapter>>,
}

impl AdapterRegistry {
    /// Build a registry, rejecting a domain claimed by two adapters.
    pub fn from_adapters(adapters: impl IntoIterator<Item = Adapter>) -> Result<Self, Error> {
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut registry = Self::default();

        for adapter in adapters {
            for domain in adapter.domains() {
                if let Some(owner) = owners.insert(domain.clone(), adapter.name().to_string()) {
                    return Err(Error::Config(format!(
                        "domain {} claimed by adapters {} and {}",
                        domain,
                        owner,
                        adapter.name()
                    )));
                }
            }
            registry.adapters.push(Arc::new(adapter));
        }

        Ok(registry)
    }

    /// Load every `*.toml` file in `dir`, in file name order.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::Config(format!("cannot read adapter directory {}: {}", dir.display(), e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| Error::Config(format!("cannot read adapter directory {}: {}", dir.display(), e)))?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut adapters = Vec::with_capacity(paths.len());
        for path in &paths {
            let text = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("cannot read adapter {}: {}", path.display(), e)))?;
            let adapter = Adapter::from_toml_str(&text).map_err(|e| match e {
                Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
                other => other,
            })?;

            tracing::info!("loaded adapter {} ({}) from {}", adapter.name(), adapter.domains().join(", "), path.display());
            adapters.push(adapter);
        }

        if adapters.is_empty() {
            tracing::warn!("no adapters found in {}", dir.display());
        }

        Self::from_adapters(adapters)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn adapters(&self) -> &[Arc<Adapter>] {
        &self.adapters
    }

    /// The adapter whose domain list contains `url`'s host.
    pub fn resolve(&self, url: &Url) -> Result<Arc<Adapter>, Error> {
        self.adapters
            .iter()
            .find(|a| a.compatible(url))
            .cloned()
            .ok_or_else(|| Error::NoAdapter(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EXAMPLE_ADAPTER;

    fn other_adapter() -> String {
        EXAMPLE_ADAPTER
            .replace(r#"name = "example""#, r#"name = "other""#)
            .replace(r#"["www.example.com"]"#, r#"["other.example.org", "m.other.example.org"]"#)
    }

    #[test]
    fn test_load_dir_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-example.toml"), EXAMPLE_ADAPTER).unwrap();
        std::fs::write(dir.path().join("a-other.toml"), other_adapter()).unwrap();
        std::fs::write(dir.path().join("README.md"), "not an adapter").unwrap();

        let registry = AdapterRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.adapters()[0].name(), "other");

        let url = Url::parse("https://m.other.example.org/list").unwrap();
        assert_eq!(registry.resolve(&url).unwrap().name(), "other");

        let url = Url::parse("https://www.example.com/list").unwrap();
        assert_eq!(registry.resolve(&url).unwrap().name(), "example");
    }

    #[test]
    fn test_resolve_unknown_host() {
        let registry = AdapterRegistry::from_adapters([Adapter::from_toml_str(EXAMPLE_ADAPTER).unwrap()]).unwrap();
        let err = registry.resolve(&Url::parse("https://unknown.test/").unwrap()).unwrap_err();
        assert!(matches!(err, Error::NoAdapter(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_duplicate_domain_rejected() {
        let first = Adapter::from_toml_str(EXAMPLE_ADAPTER).unwrap();
        let second = Adapter::from_toml_str(&EXAMPLE_ADAPTER.replace(r#"name = "example""#, r#"name = "copy""#)).unwrap();
        let result = AdapterRegistry::from_adapters([first, second]);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("www.example.com")));
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.toml"), "name = [").unwrap();
        let result = AdapterRegistry::load_dir(dir.path());
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("broken.toml")));
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(AdapterRegistry::load_dir(dir.path().join("absent")), Err(Error::Config(_))));
    }

    #[test]
    fn test_bundled_adapters_load() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../adapters");
        let registry = AdapterRegistry::load_dir(dir).unwrap();
        assert_eq!(registry.len(), 2);

        let tabelog = Url::parse("https://tabelog.com/en/kanagawa/A1401/A140104/rstLst/").unwrap();
        assert_eq!(registry.resolve(&tabelog).unwrap().name(), "tabelog");
        assert_eq!(registry.resolve(&tabelog).unwrap().define("dishes").delicious, 0.8);

        let tripadvisor = Url::parse("http://www.tripadvisor.com/Restaurants-g1021277").unwrap();
        assert_eq!(registry.resolve(&tripadvisor).unwrap().name(), "tripadvisor");
    }
}
