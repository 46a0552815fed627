//! Object storage for uploaded project media

mod minio_client;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

pub use minio_client::MinIOClient;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Request(String),
}

/// Where uploaded media lives and how it is addressed publicly
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `data` at `path`. Callers pick unique paths.
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Public URL of a stored path
    fn public_address(&self, path: &str) -> String;

    /// Remove media by the URL `public_address` returned
    async fn remove(&self, url: &str) -> Result<(), StorageError>;
}
