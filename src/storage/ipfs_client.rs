// src/storage/ipfs_client.rs
//! IPFS node storage for credential payloads.
//!
//! Talks to an IPFS HTTP API (e.g. a local kubo node on `:5001`). Used when the
//! deployment runs its own node instead of a pinning service.
//!
//! # Security Considerations
//! - All stored data is public by default (IPFS is a public network)
//! - Hashes are content-addressable and permanent

use super::ContentStore;
use crate::error::StorageError;
use crate::models::draft::DocumentUpload;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use ipfs_api_backend_hyper::{IpfsApi, IpfsClient, TryFromUri};
use log::debug;
use std::io::Cursor;
use std::sync::Arc;
use tokio::task;

/// Thread-safe IPFS client wrapper.
///
/// The underlying client's futures are not `Send`, so each call runs on a
/// blocking thread with its own single-use runtime.
#[derive(Clone)]
pub struct IpfsStorage {
    /// Shared IPFS client instance (thread-safe via Arc)
    client: Arc<IpfsClient>,
}

impl IpfsStorage {
    /// Creates a client for the node API at `api_url`, e.g. `http://localhost:5001`.
    pub fn new(api_url: &str) -> Result<Self, StorageError> {
        let client = IpfsClient::from_str(api_url).map_err(|e| StorageError::Ipfs(e.to_string()))?;
        Ok(IpfsStorage {
            client: Arc::new(client),
        })
    }

    /// Stores raw binary data in IPFS and returns its CID.
    pub async fn store_data(&self, data: &[u8]) -> Result<String, StorageError> {
        let client = self.client.clone();
        let data_owned = data.to_vec();

        let res = task::spawn_blocking(move || -> Result<String, StorageError> {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| StorageError::Ipfs(e.to_string()))?;
            rt.block_on(async {
                let reader = Cursor::new(data_owned);
                let res = client
                    .add(reader)
                    .await
                    .map_err(|e| StorageError::Ipfs(e.to_string()))?;
                Ok(res.hash)
            })
        })
        .await;

        match res {
            Ok(inner) => inner,
            Err(join_err) => Err(StorageError::Ipfs(join_err.to_string())),
        }
    }

    /// Retrieves binary data from IPFS by its CID.
    pub async fn retrieve_data(&self, hash: &str) -> Result<Bytes, StorageError> {
        let client = self.client.clone();
        let hash = hash.to_string();

        let data = task::spawn_blocking(move || -> Result<BytesMut, StorageError> {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| StorageError::Ipfs(e.to_string()))?;
            rt.block_on(async {
                client
                    .cat(&hash)
                    .map_ok(|chunk| chunk.to_vec())
                    .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                        acc.extend_from_slice(&chunk);
                        Ok(acc)
                    })
                    .await
                    .map_err(|e| StorageError::Ipfs(e.to_string()))
            })
        })
        .await;

        match data {
            Ok(inner) => inner.map(BytesMut::freeze),
            Err(join_err) => Err(StorageError::Ipfs(join_err.to_string())),
        }
    }
}

#[async_trait]
impl ContentStore for IpfsStorage {
    async fn pin_json(&self, body: &[u8]) -> Result<String, StorageError> {
        let cid = self.store_data(body).await?;
        debug!("pinned {} byte payload to ipfs node as {}", body.len(), cid);
        Ok(cid)
    }

    async fn pin_file(&self, upload: &DocumentUpload) -> Result<String, StorageError> {
        let cid = self.store_data(&upload.bytes).await?;
        debug!("pinned document {} to ipfs node as {}", upload.file_name, cid);
        Ok(cid)
    }

    async fn fetch(&self, cid: &str) -> Result<Bytes, StorageError> {
        self.retrieve_data(cid).await
    }
}
