// src/contracts/credential_registry.rs
//! Credential Registry smart contract interface.
//!
//! The registry stores, per holder, `(fingerprint, cid, issuer, isValid,
//! issuedAt)` records. Issuing appends a record; revoking flips `isValid`.

use super::CredentialLedger;
use crate::blockchain::EthClient;
use crate::error::LedgerError;
use crate::models::credential::CredentialRecord;
use crate::utils::crypto::Fingerprint;
use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use log::info;
use std::sync::Arc;

const ABI: &[u8] = include_bytes!("abi/CredentialRegistry.json");

type RecordTuple = (H256, String, Address, bool, U256);

/// Credential Registry contract wrapper.
#[derive(Clone)]
pub struct CredentialRegistry {
    client: Arc<EthClient>,
    address: Address,
}

impl CredentialRegistry {
    pub fn new(client: Arc<EthClient>, address: Address) -> Self {
        CredentialRegistry { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl CredentialLedger for CredentialRegistry {
    async fn issue_credential(
        &self,
        recipient: Address,
        fingerprint: Fingerprint,
        cid: &str,
    ) -> Result<H256, LedgerError> {
        let hash: H256 = fingerprint.into();
        let tx = self
            .client
            .send_transaction(self.address, ABI, "issueCredential", (recipient, hash, cid.to_string()))
            .await?;
        info!("issued {} to {:?} in {:?}", fingerprint, recipient, tx);
        Ok(tx)
    }

    async fn get_user_credentials(&self, owner: Address) -> Result<Vec<CredentialRecord>, LedgerError> {
        let tuples: Vec<RecordTuple> = self
            .client
            .query_contract(self.address, ABI, "getUserCredentials", owner)
            .await?;
        tuples.into_iter().map(CredentialRecord::from_tuple).collect()
    }

    async fn revoke_credential(&self, owner: Address, fingerprint: Fingerprint) -> Result<H256, LedgerError> {
        let hash: H256 = fingerprint.into();
        let tx = self
            .client
            .send_transaction(self.address, ABI, "revokeCredential", (owner, hash))
            .await?;
        info!("revoked {} of {:?} in {:?}", fingerprint, owner, tx);
        Ok(tx)
    }
}
