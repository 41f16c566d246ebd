// src/contracts/memory.rs
//! In-process ledger with the same semantics as the deployed contracts.
//!
//! All writes are made as `caller`. Revocation is only allowed to the
//! issuer of the record, as on chain.

use super::{CredentialLedger, InteractionHub};
use crate::error::LedgerError;
use crate::models::credential::CredentialRecord;
use crate::models::interaction::{Attestation, ClaimRequest};
use crate::utils::crypto::{hash_data, Fingerprint};
use async_trait::async_trait;
use chrono::Utc;
use ethers::types::{Address, H256};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    credentials: HashMap<Address, Vec<CredentialRecord>>,
    requests: Vec<ClaimRequest>,
    attestations: Vec<Attestation>,
    tx_count: u64,
}

impl State {
    fn next_tx(&mut self) -> H256 {
        self.tx_count += 1;
        H256(hash_data(&self.tx_count.to_be_bytes()))
    }
}

pub struct MemoryLedger {
    caller: Address,
    state: Mutex<State>,
}

impl MemoryLedger {
    pub fn new(caller: Address) -> Self {
        MemoryLedger {
            caller,
            state: Mutex::new(State::default()),
        }
    }

    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Seeds a claim request as if another party had created it.
    pub fn insert_request(&self, request: ClaimRequest) {
        if let Ok(mut state) = self.state.lock() {
            state.requests.push(request);
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, LedgerError> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Provider("memory ledger poisoned".into()))
    }
}

fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[async_trait]
impl CredentialLedger for MemoryLedger {
    async fn issue_credential(
        &self,
        recipient: Address,
        fingerprint: Fingerprint,
        cid: &str,
    ) -> Result<H256, LedgerError> {
        let mut state = self.lock()?;
        state.credentials.entry(recipient).or_default().push(CredentialRecord {
            credential_hash: fingerprint,
            ipfs_cid: cid.to_string(),
            issuer: self.caller,
            is_valid: true,
            issued_at: now(),
        });
        Ok(state.next_tx())
    }

    async fn get_user_credentials(&self, owner: Address) -> Result<Vec<CredentialRecord>, LedgerError> {
        let state = self.lock()?;
        Ok(state.credentials.get(&owner).cloned().unwrap_or_default())
    }

    async fn revoke_credential(&self, owner: Address, fingerprint: Fingerprint) -> Result<H256, LedgerError> {
        let mut state = self.lock()?;
        let caller = self.caller;
        let record = state
            .credentials
            .get_mut(&owner)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| r.credential_hash == fingerprint && r.issuer == caller)
            })
            .ok_or_else(|| LedgerError::Contract(format!("no credential {} issued by caller", fingerprint)))?;
        record.is_valid = false;
        Ok(state.next_tx())
    }
}

#[async_trait]
impl InteractionHub for MemoryLedger {
    async fn create_claim_request(
        &self,
        target: Address,
        fields: Vec<String>,
        reason: &str,
    ) -> Result<H256, LedgerError> {
        let mut state = self.lock()?;
        let id = state.requests.len() as u64 + 1;
        state.requests.push(ClaimRequest {
            id,
            requester: self.caller,
            subject: target,
            fields,
            purpose: reason.to_string(),
            fulfilled: false,
            created_at: now(),
        });
        Ok(state.next_tx())
    }

    async fn fulfill_claim_request(&self, request_id: u64) -> Result<H256, LedgerError> {
        let mut state = self.lock()?;
        let caller = self.caller;
        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| LedgerError::Contract(format!("unknown request {}", request_id)))?;
        if request.subject != caller {
            return Err(LedgerError::Contract("only the subject can fulfill".into()));
        }
        if request.fulfilled {
            return Err(LedgerError::Contract("already fulfilled".into()));
        }
        request.fulfilled = true;
        Ok(state.next_tx())
    }

    async fn create_attestation(&self, target: Address, text: &str) -> Result<H256, LedgerError> {
        let mut state = self.lock()?;
        state.attestations.push(Attestation {
            issuer: self.caller,
            subject: target,
            text: text.to_string(),
            created_at: now(),
        });
        Ok(state.next_tx())
    }

    async fn requests_for_user(&self, user: Address) -> Result<Vec<ClaimRequest>, LedgerError> {
        let state = self.lock()?;
        Ok(state
            .requests
            .iter()
            .filter(|r| r.subject == user)
            .cloned()
            .collect())
    }

    async fn attestations_for(&self, user: Address) -> Result<Vec<Attestation>, LedgerError> {
        let state = self.lock()?;
        Ok(state
            .attestations
            .iter()
            .filter(|a| a.subject == user)
            .cloned()
            .collect())
    }
}
