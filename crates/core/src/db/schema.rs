//! Dataset schema.
//!
//! The schema is recreated from scratch on every write; the ranking service
//! only ever sees the latest build.

use tokio_rusqlite::{params, rusqlite};

/// Tables read by the ranking service.
pub const DATASET_SQL: &str = include_str!("../../sql/dataset.sql");

/// Preference categories seeded into the `categories` table.
pub const DEFAULT_CATEGORIES: &[&str] = &["I prefer quiet places", "I enjoy Mexican Food", "I drive a car"];

/// Drop and recreate every dataset table and seed the default categories.
pub fn recreate(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(DATASET_SQL)?;

    let mut stmt = conn.prepare("INSERT INTO categories(description) VALUES (?1)")?;
    for category in DEFAULT_CATEGORIES {
        stmt.execute(params![category])?;
    }

    Ok(())
}
