//! Blob store boundary for node data attachments

use crate::graph::FileId;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    #[error("Blob {0} not found")]
    NotFound(FileId),

    #[error("Blob store error: {0}")]
    Storage(String),
}

pub type BlobResult<T> = Result<T, BlobError>;

/// External payload storage. Calls happen outside the engine's critical
/// section.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `payload` under `file_id` and return the id it is reachable by
    async fn put(&self, file_id: FileId, payload: Bytes) -> BlobResult<FileId>;

    async fn get(&self, file_id: &FileId) -> BlobResult<Bytes>;
}

/// In-process blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<FileId, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, file_id: FileId, payload: Bytes) -> BlobResult<FileId> {
        self.blobs.write().await.insert(file_id.clone(), payload);
        Ok(file_id)
    }

    async fn get(&self, file_id: &FileId) -> BlobResult<Bytes> {
        self.blobs
            .read()
            .await
            .get(file_id)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(file_id.clone()))
    }
}
