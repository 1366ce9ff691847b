//! Attachment storage for group files.
//!
//! The store is an explicit dependency injected through application state so
//! tests can substitute a fake. The stored identifier is opaque; the public
//! URL clients see is always computed from it, never persisted.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid attachment identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Persist `bytes` under a fresh identifier derived from `filename`.
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Remove a stored attachment. A missing file is treated as success.
    async fn delete(&self, id: &str) -> Result<(), StorageError>;

    /// Public-facing URL for a stored identifier.
    fn public_url(&self, id: &str) -> String;
}

/// Resolve an optional stored identifier into a public reference.
pub fn public_reference(store: &dyn AttachmentStore, stored: Option<&str>) -> Option<String> {
    match stored {
        Some(id) if !id.is_empty() => Some(store.public_url(id)),
        _ => None,
    }
}

/// Filesystem-backed store. Files land in a flat directory under uuid-prefixed
/// names and are served statically under `/uploads/`.
pub struct LocalStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config() -> Self {
        let storage = &config::config().storage;
        Self::new(&storage.root, &storage.public_base_url)
    }

    fn full_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        // Identifiers are single path segments; anything else is a traversal
        // attempt or corrupted data.
        if id.is_empty() || id.contains('/') || id.contains('\\') || id == "." || id == ".." {
            return Err(StorageError::InvalidIdentifier(id.to_string()));
        }
        Ok(self.root.join(id))
    }

    fn safe_filename(filename: &str) -> String {
        let base = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("archivo");
        base.chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
}

#[async_trait]
impl AttachmentStore for LocalStore {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let id = format!("{}_{}", Uuid::new_v4().simple(), Self::safe_filename(filename));
        let path = self.full_path(&id)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, bytes).await?;
        tracing::debug!("stored attachment {}", id);
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let path = self.full_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone; the goal is met.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, id: &str) -> String {
        format!("{}/uploads/{}", self.public_base_url, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> LocalStore {
        LocalStore::new(dir, "http://localhost:3000/")
    }

    #[tokio::test]
    async fn store_and_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let id = store.store("resolucion.pdf", b"pdf-bytes").await.unwrap();
        assert!(id.ends_with("_resolucion.pdf"));
        assert_eq!(fs::read(dir.path().join(&id)).await.unwrap(), b"pdf-bytes");

        store.delete(&id).await.unwrap();
        assert!(!dir.path().join(&id).exists());
    }

    #[tokio::test]
    async fn delete_of_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.delete("nope.pdf").await.is_ok());
    }

    #[tokio::test]
    async fn rejects_traversal_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.delete("../../etc/passwd").await.is_err());
    }

    #[test]
    fn public_url_joins_base_and_id() {
        let store = LocalStore::new("/tmp/x", "https://api.example.com");
        assert_eq!(
            store.public_url("abc_doc.pdf"),
            "https://api.example.com/uploads/abc_doc.pdf"
        );
    }

    #[test]
    fn public_reference_skips_missing_attachment() {
        let store = LocalStore::new("/tmp/x", "https://api.example.com");
        assert_eq!(public_reference(&store, None), None);
        assert_eq!(public_reference(&store, Some("")), None);
        assert_eq!(
            public_reference(&store, Some("a.pdf")),
            Some("https://api.example.com/uploads/a.pdf".to_string())
        );
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(LocalStore::safe_filename("../../x/y res 1.pdf"), "y_res_1.pdf");
        assert_eq!(LocalStore::safe_filename(""), "archivo");
    }
}
