//! Core types and shared functionality for savor.
//!
//! This crate provides:
//! - Unified error types
//! - Layered configuration
//! - Domain types shared by the crawler and the dataset writer
//! - Disk-backed page storage keyed by URL digest
//! - Station proximity lookup
//! - SQLite dataset writer for the ranking service

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod model;
pub mod stations;

pub use cache::PageStore;
pub use config::{AppConfig, ConfigError};
pub use db::{DatasetDb, RestaurantRow};
pub use error::Error;
pub use model::{Coordinate, Semantics, Station};
pub use stations::StationIndex;
