//! Selector rules: locate strings in a parsed document.

use regex::Regex;
use savor_core::Error;
use scraper::{Html, Selector};
use serde::Deserialize;

/// Uncompiled rule as written in an adapter file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    /// CSS selector.
    pub path: String,
    /// Attribute to read instead of the element text.
    #[serde(default)]
    pub attr: Option<String>,
    /// Pattern whose first capture group replaces the located value.
    #[serde(default)]
    pub regex: Option<String>,
}

/// A compiled selector rule.
///
/// Every matching element yields one string: the attribute value (or the
/// concatenated text), narrowed by the regex's first capture group when a
/// regex is set, and finally trimmed. A regex that does not match yields an
/// empty string for that element.
#[derive(Debug, Clone)]
pub struct Rule {
    path: String,
    selector: Selector,
    attr: Option<String>,
    regex: Option<Regex>,
}

impl Rule {
    pub fn new(path: &str, attr: Option<&str>, regex: Option<&str>) -> Result<Self, Error> {
        let selector =
            Selector::parse(path).map_err(|e| Error::Config(format!("invalid selector {:?}: {}", path, e)))?;

        let regex = regex
            .filter(|r| !r.is_empty())
            .map(|r| Regex::new(r).map_err(|e| Error::Config(format!("invalid regex {:?}: {}", r, e))))
            .transpose()?;

        Ok(Self {
            path: path.to_string(),
            selector,
            attr: attr.filter(|a| !a.is_empty()).map(str::to_string),
            regex,
        })
    }

    pub fn from_config(config: &RuleConfig) -> Result<Self, Error> {
        Self::new(&config.path, config.attr.as_deref(), config.regex.as_deref())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// One trimmed string per matching element, in document order.
    pub fn locate_strings(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.selector)
            .map(|element| {
                let raw = match &self.attr {
                    Some(attr) => element.value().attr(attr).unwrap_or_default().to_string(),
                    None => element.text().collect::<String>(),
                };

                let narrowed = match &self.regex {
                    Some(re) => re
                        .captures(&raw)
                        .and_then(|caps| caps.get(1))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                    None => raw,
                };

                narrowed.trim().to_string()
            })
            .collect()
    }

    /// All located strings joined with a single space.
    pub fn locate_string(&self, document: &Html) -> String {
        self.locate_strings(document).join(" ")
    }

    pub fn locate_int(&self, document: &Html) -> Result<i64, Error> {
        let value = self.locate_string(document);
        value
            .parse::<i64>()
            .map_err(|e| Error::extract(&self.path, format!("{:?} is not an integer: {}", value, e)))
    }

    pub fn locate_float(&self, document: &Html) -> Result<f64, Error> {
        let value = self.locate_string(document);
        value
            .parse::<f64>()
            .map_err(|e| Error::extract(&self.path, format!("{:?} is not a number: {}", value, e)))
    }
}
