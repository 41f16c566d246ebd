// src/storage/mod.rs
//! Content-addressed storage for credential payloads and source documents.
//!
//! The integrity checker depends on `fetch` returning exactly what was pinned;
//! payload bodies are always pinned in canonical form.

use crate::error::StorageError;
use crate::models::draft::DocumentUpload;
use async_trait::async_trait;
use bytes::Bytes;

pub mod ipfs_client;
pub mod memory;
pub mod pinata;

pub use ipfs_client::IpfsStorage;
pub use memory::MemoryStore;
pub use pinata::PinataClient;

/// Pin/fetch interface of a content-addressed store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Pins a JSON document (already canonical) and returns its content address.
    async fn pin_json(&self, body: &[u8]) -> Result<String, StorageError>;

    /// Pins an arbitrary file and returns its content address.
    async fn pin_file(&self, upload: &DocumentUpload) -> Result<String, StorageError>;

    /// Fetches the bytes stored under `cid`.
    async fn fetch(&self, cid: &str) -> Result<Bytes, StorageError>;
}
