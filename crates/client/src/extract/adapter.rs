//! Declarative per-site extraction adapters.
//!
//! An adapter is compiled once from its TOML description and then shared
//! read-only by every crawl worker.

use std::collections::BTreeMap;

use figment::Figment;
use figment::providers::{Format, Toml};
use savor_core::{Error, Semantics};
use scraper::Html;
use serde::Deserialize;
use url::Url;

use super::rule::{Rule, RuleConfig};
use crate::fetch::resolve;

/// Adapter description as written in an adapter file.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    pub name: String,
    pub domains: Vec<String>,
    pub index: IndexConfig,
    pub item: ItemConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    pub items: RuleConfig,
    pub next: RuleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemConfig {
    pub name: RuleConfig,
    pub address: RuleConfig,
    pub count: RuleConfig,
    #[serde(default)]
    pub props: BTreeMap<String, PropertyConfig>,
}

/// A rating category: where to find it and what it means.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyConfig {
    pub selector: RuleConfig,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub semantics: Semantics,
}

impl AdapterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Figment::from(Toml::string(text))
            .extract()
            .map_err(|e| Error::Config(format!("invalid adapter: {}", e)))
    }
}

/// Links found on an index page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexPage {
    pub next: Option<Url>,
    pub items: Vec<Url>,
}

/// Fields extracted from one detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedReview {
    pub name: String,
    pub address: String,
    /// Category name to value remapped onto `[-1, 1]`.
    pub features: BTreeMap<String, f64>,
    /// Review count, used as the aggregation weight.
    pub weight: f64,
}

#[derive(Debug, Clone)]
struct Property {
    rule: Rule,
    scale: Option<f64>,
    semantics: Semantics,
}

/// A compiled extraction adapter.
#[derive(Debug, Clone)]
pub struct Adapter {
    name: String,
    domains: Vec<String>,
    items: Rule,
    next: Rule,
    item_name: Rule,
    address: Rule,
    count: Rule,
    props: BTreeMap<String, Property>,
}

impl Adapter {
    /// Compile every selector and regex, rejecting malformed descriptions.
    pub fn from_config(config: AdapterConfig) -> Result<Self, Error> {
        let tag = |e: Error| match e {
            Error::Config(msg) => Error::Config(format!("adapter {}: {}", config.name, msg)),
            other => other,
        };

        let domains: Vec<String> = config
            .domains
            .iter()
            .map(|d| d.trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        if domains.is_empty() {
            return Err(Error::Config(format!("adapter {}: no domains", config.name)));
        }

        let mut props = BTreeMap::new();
        for (category, prop) in &config.item.props {
            if let Some(scale) = prop.scale
                && (scale <= 0.0 || !scale.is_finite())
            {
                return Err(Error::Config(format!(
                    "adapter {}: category {}: scale must be positive, got {}",
                    config.name, category, scale
                )));
            }

            let rule = Rule::from_config(&prop.selector).map_err(tag)?;
            props.insert(category.clone(), Property { rule, scale: prop.scale, semantics: prop.semantics });
        }

        Ok(Self {
            items: Rule::from_config(&config.index.items).map_err(tag)?,
            next: Rule::from_config(&config.index.next).map_err(tag)?,
            item_name: Rule::from_config(&config.item.name).map_err(tag)?,
            address: Rule::from_config(&config.item.address).map_err(tag)?,
            count: Rule::from_config(&config.item.count).map_err(tag)?,
            name: config.name,
            domains,
            props,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Self::from_config(AdapterConfig::from_toml_str(text)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Whether `url`'s host is one of this adapter's domains.
    pub fn compatible(&self, url: &Url) -> bool {
        url.host_str()
            .map(|host| self.domains.iter().any(|d| d.eq_ignore_ascii_case(host)))
            .unwrap_or(false)
    }

    /// Extract the next-page link and the detail links from an index page.
    ///
    /// Links are resolved against `base`. Links that cannot be resolved are
    /// logged and skipped; an empty next link ends pagination.
    pub fn index(&self, document: &Html, base: &Url) -> IndexPage {
        let items = self
            .items
            .locate_strings(document)
            .into_iter()
            .filter_map(|href| match resolve(base, &href) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("{}: skipping item link {:?} on {}: {}", self.name, href, base, e);
                    None
                }
            })
            .collect();

        let next_ref = self.next.locate_string(document);
        let next = if next_ref.is_empty() {
            None
        } else {
            match resolve(base, &next_ref) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("{}: ignoring next link {:?} on {}: {}", self.name, next_ref, base, e);
                    None
                }
            }
        };

        IndexPage { next, items }
    }

    /// Extract a review from a detail page.
    ///
    /// # Errors
    ///
    /// `Error::ExtractFailed` naming the field when the name or address is
    /// empty, the count is not a non-negative integer, or a category value is
    /// not a number.
    pub fn review(&self, document: &Html) -> Result<ExtractedReview, Error> {
        let name = self.item_name.locate_string(document);
        if name.is_empty() {
            return Err(Error::extract("name", "empty"));
        }

        let address = self.address.locate_string(document);
        if address.is_empty() {
            return Err(Error::extract("address", "empty"));
        }

        let count = self
            .count
            .locate_int(document)
            .map_err(|e| Error::extract("count", e.to_string()))?;
        if count < 0 {
            return Err(Error::extract("count", format!("negative review count {}", count)));
        }

        let mut features = BTreeMap::new();
        for (category, prop) in &self.props {
            let mut value = prop
                .rule
                .locate_float(document)
                .map_err(|e| Error::extract(category, e.to_string()))?;

            if let Some(scale) = prop.scale {
                value /= scale;
            }

            features.insert(category.clone(), value * 2.0 - 1.0);
        }

        Ok(ExtractedReview { name, address, features, weight: count as f64 })
    }

    /// Semantic weights of `category`; zero for unknown categories.
    pub fn define(&self, category: &str) -> Semantics {
        self.props.get(category).map(|p| p.semantics).unwrap_or(Semantics::ZERO)
    }
}
