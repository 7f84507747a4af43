//! Disk storage for fetched page bodies.
//!
//! Layout: `<dir>/<hex(md5(url))>.html` holding the raw response bytes, no
//! headers. Entries are written once and never expire.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::hash::page_file_name;
use crate::Error;

/// Directory-backed page store keyed by URL digest.
#[derive(Debug)]
pub struct PageStore {
    dir: PathBuf,
    tmp_seq: AtomicU64,
}

impl PageStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| Error::cache_io(&dir, e))?;
        Ok(Self { dir, tmp_seq: AtomicU64::new(0) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cached body for `url`, whether or not it exists yet.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(page_file_name(url))
    }

    /// Read the cached body for `url`, or `None` on a miss.
    pub async fn read(&self, url: &str) -> Result<Option<Vec<u8>>, Error> {
        let path = self.path_for(url);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::cache_io(path, e)),
        }
    }

    /// Persist `bytes` verbatim as the body for `url`.
    ///
    /// The file is written under a temporary name and renamed into place, so a
    /// concurrent reader sees either nothing or the complete body.
    pub async fn write(&self, url: &str, bytes: &[u8]) -> Result<(), Error> {
        let path = self.path_for(url);
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));

        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            return Err(Error::cache_io(tmp, e));
        }

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::cache_io(path, e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("webcache");
        let store = PageStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[tokio::test]
    async fn test_read_miss() {
        let root = tempfile::tempdir().unwrap();
        let store = PageStore::open(root.path()).unwrap();
        assert!(store.read("https://example.com/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_is_verbatim() {
        let root = tempfile::tempdir().unwrap();
        let store = PageStore::open(root.path()).unwrap();
        let body = b"<html><body>\xe3\x81\x8a\xe3\x81\x84\xe3\x81\x97\xe3\x81\x84</body></html>";

        store.write("https://example.com/a", body).await.unwrap();
        let cached = store.read("https://example.com/a").await.unwrap().unwrap();
        assert_eq!(cached, body);

        let entries: Vec<_> = std::fs::read_dir(root.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temporary file left behind");
    }

    #[tokio::test]
    async fn test_path_layout() {
        let root = tempfile::tempdir().unwrap();
        let store = PageStore::open(root.path()).unwrap();
        let path = store.path_for("http://example.com");
        assert_eq!(path, root.path().join("a9b9f04336ce0181a08e774e01113b31.html"));
    }
}
