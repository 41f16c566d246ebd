// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Turns a confirmed [`IssuanceDraft`] into an anchored credential:
//! authenticate, pin the source document, build and canonicalize the
//! payload, pin it, then record `(recipient, fingerprint, cid)` on the
//! credential registry. Revocation goes through the same gate.

use crate::contracts::CredentialLedger;
use crate::error::{ExtractionError, IssueError};
use crate::models::credential::CredentialPayload;
use crate::models::draft::IssuanceDraft;
use crate::services::extraction::DocumentExtractor;
use crate::storage::ContentStore;
use crate::utils::crypto::{fingerprint_bytes, Fingerprint};
use crate::utils::serialization::canonicalize;
use crate::wallet::auth_gate::AuthenticationGate;
use chrono::Utc;
use ethers::types::{Address, H256};
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

/// Everything produced by a successful issuance.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    pub fingerprint: Fingerprint,
    /// Content address of the pinned payload
    pub cid: String,
    pub recipient: Address,
    pub tx_hash: H256,
    pub payload: CredentialPayload,
}

/// Issues and revokes credentials on behalf of one issuer address.
#[derive(Clone)]
pub struct CredentialIssuer {
    /// Address transactions are sent from
    issuer: Address,
    store: Arc<dyn ContentStore>,
    ledger: Arc<dyn CredentialLedger>,
    gate: Arc<dyn AuthenticationGate>,
    extractor: Option<Arc<dyn DocumentExtractor>>,
}

impl CredentialIssuer {
    pub fn new(
        issuer: Address,
        store: Arc<dyn ContentStore>,
        ledger: Arc<dyn CredentialLedger>,
        gate: Arc<dyn AuthenticationGate>,
    ) -> Self {
        CredentialIssuer {
            issuer,
            store,
            ledger,
            gate,
            extractor: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn issuer(&self) -> Address {
        self.issuer
    }

    async fn authorize(&self) -> Result<(), IssueError> {
        self.gate
            .authenticate(&format!("{:?}", self.issuer))
            .await
            .into_result()
            .map_err(IssueError::AuthDenied)
    }

    /// Runs extraction on the attached upload and applies it to the draft.
    pub async fn extract_into(&self, draft: &mut IssuanceDraft) -> Result<(), IssueError> {
        let extractor = self
            .extractor
            .as_ref()
            .ok_or(IssueError::Extraction(ExtractionError::MissingApiKey))?;
        let upload = draft.upload().ok_or(IssueError::NoDocument)?;
        let extracted = extractor.extract(upload, draft.document_type()).await?;
        draft.apply_extraction(&extracted)
    }

    /// Issues a credential from `draft`.
    ///
    /// Nothing is pinned or written unless the gate grants and the draft
    /// validates.
    pub async fn issue(&self, draft: &IssuanceDraft) -> Result<IssuedCredential, IssueError> {
        self.authorize().await?;

        let mut payload = draft.build_payload(self.issuer, None, Utc::now())?;
        let recipient = draft.target_address(self.issuer);

        if let Some(upload) = draft.upload() {
            let document_cid = self.store.pin_file(upload).await?;
            debug!("pinned source document {} at {}", upload.file_name, document_cid);
            payload.document_cid = Some(document_cid);
        }

        let body = canonicalize(&payload)?;
        let fingerprint = fingerprint_bytes(&body);
        let cid = self.store.pin_json(&body).await?;
        let tx_hash = self.ledger.issue_credential(recipient, fingerprint, &cid).await?;

        info!(
            "issued {} credential {} to {:?} (cid {}, tx {:?})",
            payload.credential_type, fingerprint, recipient, cid, tx_hash
        );
        Ok(IssuedCredential {
            fingerprint,
            cid,
            recipient,
            tx_hash,
            payload,
        })
    }

    /// Revokes a credential previously issued to `owner`.
    pub async fn revoke(&self, owner: Address, fingerprint: Fingerprint) -> Result<H256, IssueError> {
        self.authorize().await?;
        let tx_hash = self.ledger.revoke_credential(owner, fingerprint).await?;
        info!("revoked {} held by {:?} (tx {:?})", fingerprint, owner, tx_hash);
        Ok(tx_hash)
    }
}
