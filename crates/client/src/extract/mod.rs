//! Declarative review extraction.
//!
//! ### Rules
//! - A `Rule` is a CSS selector plus an optional attribute and regex.
//! - Located strings are trimmed; multiple matches are joined with a space.
//!
//! ### Adapters
//! - One TOML file per site: domains, index rules (detail links and next
//!   page), item rules (name, address, review count), and rating categories.
//! - Category values are divided by their `scale` and remapped onto `[-1, 1]`.
//! - Each category carries the semantic weights used during aggregation.
//!
//! ### Registry
//! - Adapters are loaded from a directory at startup and dispatched by exact
//!   host match.

pub mod adapter;
pub mod registry;
pub mod rule;

pub use adapter::{Adapter, AdapterConfig, ExtractedReview, IndexPage};
pub use registry::AdapterRegistry;
pub use rule::{Rule, RuleConfig};
