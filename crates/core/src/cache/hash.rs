//! URL-addressed cache key generation.

use md5::{Digest, Md5};

/// Extension appended to every cached page file.
pub const PAGE_EXTENSION: &str = "html";

/// Compute the hex digest used as the storage key for a URL.
///
/// The digest covers the text exactly as given. Callers pass the
/// serialization of a parsed `Url`, so spellings that parse to the same URL
/// share one key.
pub fn compute_cache_key(url: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// File name of the cached page for `url`: `<hex(md5(url))>.html`.
pub fn page_file_name(url: &str) -> String {
    format!("{}.{}", compute_cache_key(url), PAGE_EXTENSION)
}
