//! SQLite dataset consumed by the ranking service.
//!
//! The writer replaces the whole dataset on every run: tables are dropped and
//! recreated, then every collated restaurant is inserted in one transaction.

pub mod connection;
pub mod restaurants;
pub mod schema;

pub use connection::DatasetDb;
pub use restaurants::RestaurantRow;
