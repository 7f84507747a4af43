//! Disk-backed page cache storage.
//!
//! Pages are addressed by the MD5 digest of their URL and stored as raw
//! response bytes. There is no invalidation: a cached page is served for as
//! long as its file exists.

pub mod hash;
pub mod pages;

pub use pages::PageStore;
