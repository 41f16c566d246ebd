// src/services/interaction.rs
//! Claim requests and attestations between addresses.
//!
//! Verifiers ask holders for specific credential fields; holders answer by
//! fulfilling the request with one of their valid credentials. The answer is
//! the disclosure view restricted to the requested fields, and the requester
//! is told which payload was shared through a `selected_cid:` attestation.

use crate::contracts::{CredentialLedger, InteractionHub};
use crate::error::{DisclosureError, InteractionError};
use crate::models::interaction::{is_claimable_field, Attestation, ClaimRequest, DEFAULT_CLAIM_FIELDS};
use crate::services::disclosure::{DisclosureAllowList, DisclosureService};
use crate::utils::crypto::Fingerprint;
use crate::wallet::auth_gate::AuthenticationGate;
use ethers::types::{Address, H256};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Prefix of the attestation that tells a requester which payload was shared.
pub const SELECTED_CID_PREFIX: &str = "selected_cid:";

/// Result of answering a claim request.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FulfilledClaim {
    pub request_id: u64,
    pub tx_hash: H256,
    pub shared_cid: String,
    pub disclosed: BTreeMap<String, Value>,
    /// False when the follow-up attestation to the requester failed
    pub requester_notified: bool,
}

pub struct InteractionService {
    account: Address,
    hub: Arc<dyn InteractionHub>,
    ledger: Arc<dyn CredentialLedger>,
    disclosure: DisclosureService,
    gate: Arc<dyn AuthenticationGate>,
}

impl InteractionService {
    pub fn new(
        account: Address,
        hub: Arc<dyn InteractionHub>,
        ledger: Arc<dyn CredentialLedger>,
        disclosure: DisclosureService,
        gate: Arc<dyn AuthenticationGate>,
    ) -> Self {
        InteractionService {
            account,
            hub,
            ledger,
            disclosure,
            gate,
        }
    }

    /// Asks `target` to disclose `fields`. No fields means the default set.
    pub async fn request_claim(
        &self,
        target: Address,
        fields: Vec<String>,
        reason: &str,
    ) -> Result<H256, InteractionError> {
        if reason.trim().is_empty() {
            return Err(InteractionError::BlankReason);
        }
        let fields: Vec<String> = if fields.is_empty() {
            DEFAULT_CLAIM_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            fields.into_iter().filter(|f| is_claimable_field(f)).collect()
        };
        if fields.is_empty() {
            return Err(InteractionError::NoFields);
        }
        let tx_hash = self.hub.create_claim_request(target, fields, reason).await?;
        info!("claim request sent to {:?} (tx {:?})", target, tx_hash);
        Ok(tx_hash)
    }

    pub async fn attest(&self, target: Address, text: &str) -> Result<H256, InteractionError> {
        if text.trim().is_empty() {
            return Err(InteractionError::BlankText);
        }
        Ok(self.hub.create_attestation(target, text).await?)
    }

    /// Claim requests addressed to this account.
    pub async fn incoming_requests(&self) -> Result<Vec<ClaimRequest>, InteractionError> {
        Ok(self.hub.requests_for_user(self.account).await?)
    }

    pub async fn attestations(&self) -> Result<Vec<Attestation>, InteractionError> {
        Ok(self.hub.attestations_for(self.account).await?)
    }

    /// Answers claim request `request_id` with the credential `credential`.
    pub async fn fulfill(
        &self,
        request_id: u64,
        credential: Fingerprint,
    ) -> Result<FulfilledClaim, InteractionError> {
        let request = self
            .incoming_requests()
            .await?
            .into_iter()
            .find(|r| r.id == request_id)
            .ok_or(InteractionError::RequestNotFound(request_id))?;
        if request.fulfilled {
            return Err(InteractionError::AlreadyFulfilled(request_id));
        }

        let record = self
            .ledger
            .get_user_credentials(self.account)
            .await?
            .into_iter()
            .find(|r| r.credential_hash == credential)
            .ok_or(InteractionError::CredentialNotFound(credential))?;
        if !record.is_valid {
            return Err(InteractionError::Disclosure(DisclosureError::Revoked));
        }

        self.gate
            .authenticate(&format!("{:?}", self.account))
            .await
            .into_result()
            .map_err(InteractionError::AuthDenied)?;

        let disclosed = self
            .disclosure
            .disclose_record(&record, &DisclosureAllowList::claim_request(&request))
            .await?;
        let tx_hash = self.hub.fulfill_claim_request(request_id).await?;

        let note = format!("{}{}", SELECTED_CID_PREFIX, record.ipfs_cid);
        let requester_notified = match self.hub.create_attestation(request.requester, &note).await {
            Ok(_) => true,
            Err(e) => {
                warn!("claim {} fulfilled but notifying {:?} failed: {}", request_id, request.requester, e);
                false
            }
        };

        info!("fulfilled claim request {} with {}", request_id, credential);
        Ok(FulfilledClaim {
            request_id,
            tx_hash,
            shared_cid: record.ipfs_cid,
            disclosed,
            requester_notified,
        })
    }
}
