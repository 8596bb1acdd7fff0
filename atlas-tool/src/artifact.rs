//! On-disk copies of fetched and extracted documents.
//!
//! Files are named by [`artifact_key`] so the same URL always maps to the same file. They exist
//! for caching and debugging by external tools; nothing in the pipeline reads them back, so a
//! failed write is logged and otherwise ignored.

use std::fs;
use std::path::{Path, PathBuf};

use atlas_core::PathsConfig;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// First 16 hex digits of SHA-256 over the URL.
pub fn artifact_key(url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    digest[..16].to_string()
}

/// Writes `raw_html/<key>.html` and `cleaned/<key>.txt` under a data directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    raw_dir: PathBuf,
    cleaned_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self { raw_dir: data_dir.join("raw_html"), cleaned_dir: data_dir.join("cleaned") }
    }

    pub fn from_config(paths: &PathsConfig) -> Self {
        Self { raw_dir: paths.raw_html_dir(), cleaned_dir: paths.cleaned_dir() }
    }

    pub fn raw_path(&self, url: &str) -> PathBuf {
        self.raw_dir.join(format!("{}.html", artifact_key(url)))
    }

    pub fn cleaned_path(&self, url: &str) -> PathBuf {
        self.cleaned_dir.join(format!("{}.txt", artifact_key(url)))
    }

    /// Persist a raw fetched body. Returns whether the write succeeded.
    pub fn save_raw(&self, url: &str, body: &str) -> bool {
        write_logged(&self.raw_path(url), body, url)
    }

    /// Persist extracted text. Returns whether the write succeeded.
    pub fn save_cleaned(&self, url: &str, text: &str) -> bool {
        write_logged(&self.cleaned_path(url), text, url)
    }
}

fn write_logged(path: &Path, contents: &str, url: &str) -> bool {
    let result = match path.parent() {
        Some(dir) => fs::create_dir_all(dir).and_then(|()| fs::write(path, contents)),
        None => fs::write(path, contents),
    };
    match result {
        Ok(()) => {
            debug!(document.url = url, path = %path.display(), "artifact written");
            true
        }
        Err(e) => {
            warn!(document.url = url, path = %path.display(), error = %e, "artifact write failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_sixteen_hex_digits_and_stable() {
        let key = artifact_key("https://example.com/a");
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, artifact_key("https://example.com/a"));
        assert_ne!(key, artifact_key("https://example.com/b"));
    }

    #[test]
    fn writes_into_raw_and_cleaned_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let url = "https://example.com/page";

        assert!(store.save_raw(url, "<html></html>"));
        assert!(store.save_cleaned(url, "text"));

        let key = artifact_key(url);
        let raw = dir.path().join("raw_html").join(format!("{key}.html"));
        let cleaned = dir.path().join("cleaned").join(format!("{key}.txt"));
        assert_eq!(fs::read_to_string(raw).unwrap(), "<html></html>");
        assert_eq!(fs::read_to_string(cleaned).unwrap(), "text");
    }

    #[test]
    fn write_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the directory should be makes create_dir_all fail.
        let blocker = dir.path().join("data");
        fs::write(&blocker, "not a directory").unwrap();

        let store = ArtifactStore::new(&blocker);
        assert!(!store.save_raw("https://example.com", "body"));
    }
}
