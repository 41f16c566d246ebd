// src/contracts/mod.rs
//! Smart contract collaborators.
//!
//! Each contract sits behind a trait so flows can run against the real chain
//! or the in-process [`MemoryLedger`].

use crate::error::LedgerError;
use crate::models::credential::CredentialRecord;
use crate::models::interaction::{Attestation, ClaimRequest};
use crate::utils::crypto::Fingerprint;
use async_trait::async_trait;
use ethers::types::{Address, H256};

pub mod credential_registry;
pub mod interaction_hub;
pub mod memory;
pub mod trust_registry;

pub use credential_registry::CredentialRegistry;
pub use interaction_hub::InteractionHubContract;
pub use memory::MemoryLedger;
pub use trust_registry::{OnChainTrustRegistry, StaticTrustList};

/// Credential anchoring ledger.
#[async_trait]
pub trait CredentialLedger: Send + Sync {
    async fn issue_credential(
        &self,
        recipient: Address,
        fingerprint: Fingerprint,
        cid: &str,
    ) -> Result<H256, LedgerError>;

    async fn get_user_credentials(&self, owner: Address) -> Result<Vec<CredentialRecord>, LedgerError>;

    async fn revoke_credential(&self, owner: Address, fingerprint: Fingerprint) -> Result<H256, LedgerError>;
}

/// Issuer reputation lookup.
#[async_trait]
pub trait TrustRegistry: Send + Sync {
    async fn is_trusted(&self, issuer: Address) -> Result<bool, LedgerError>;
}

/// Claim requests and attestations.
#[async_trait]
pub trait InteractionHub: Send + Sync {
    async fn create_claim_request(
        &self,
        target: Address,
        fields: Vec<String>,
        reason: &str,
    ) -> Result<H256, LedgerError>;

    async fn fulfill_claim_request(&self, request_id: u64) -> Result<H256, LedgerError>;

    async fn create_attestation(&self, target: Address, text: &str) -> Result<H256, LedgerError>;

    async fn requests_for_user(&self, user: Address) -> Result<Vec<ClaimRequest>, LedgerError>;

    async fn attestations_for(&self, user: Address) -> Result<Vec<Attestation>, LedgerError>;
}
