// src/storage/memory.rs
//! In-process content store.
//!
//! Addresses are `mem-` plus the Keccak-256 hex of the content, so identical
//! bytes always land at the same address.

use super::ContentStore;
use crate::error::StorageError;
use crate::models::draft::DocumentUpload;
use crate::utils::crypto::hash_data;
use async_trait::async_trait;
use bytes::Bytes;
use ethers::utils::hex;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&self, bytes: Bytes) -> String {
        let cid = format!("mem-{}", hex::encode(hash_data(&bytes)));
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(cid.clone(), bytes);
        }
        cid
    }

    /// Replaces the bytes at an existing address. Used to simulate a storage
    /// provider serving altered content.
    pub fn overwrite(&self, cid: &str, bytes: impl Into<Bytes>) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(cid.to_string(), bytes.into());
        }
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn pin_json(&self, body: &[u8]) -> Result<String, StorageError> {
        Ok(self.put(Bytes::copy_from_slice(body)))
    }

    async fn pin_file(&self, upload: &DocumentUpload) -> Result<String, StorageError> {
        Ok(self.put(upload.bytes.clone()))
    }

    async fn fetch(&self, cid: &str) -> Result<Bytes, StorageError> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StorageError::Ipfs("memory store poisoned".into()))?;
        objects.get(cid).cloned().ok_or_else(|| StorageError::Status {
            status: 404,
            body: format!("{} not found", cid),
        })
    }
}
