// src/error.rs
//! Error types for each collaborator boundary and flow.
//!
//! Integrity check results (authentic / tampered / revoked / fetch failed) are
//! values of `VerificationOutcome`, not errors.

use crate::models::document::DocumentType;
use crate::utils::crypto::Fingerprint;
use thiserror::Error;

/// Failures talking to content-addressed storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("pinning credentials are missing; set NH_PINATA_JWT or NH_PINATA_API_KEY + NH_PINATA_SECRET_API_KEY")]
    MissingCredentials,

    #[error("pinning service rejected credentials (401)")]
    Unauthorized,

    #[error("storage returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ipfs node error: {0}")]
    Ipfs(String),

    #[error("pinning response did not include a content address")]
    MissingCid,

    #[error("no gateway configured")]
    NoGateways,

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures reading from or writing to the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid contract ABI: {0}")]
    Abi(String),

    #[error("contract call failed: {0}")]
    Contract(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("no signing key configured; write calls are unavailable")]
    MissingSigner,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Failures from the document-extraction service.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction API key is not configured")]
    MissingApiKey,

    #[error("extraction request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extraction quota exceeded; retry later")]
    QuotaExceeded,

    #[error("extraction service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("extraction service returned no text")]
    EmptyResponse,

    #[error("extraction output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Failures in the issuance flow.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("authentication denied: {0}")]
    AuthDenied(String),

    #[error("upload a document first")]
    NoDocument,

    #[error("extract data from the uploaded document before issuing a credential")]
    NothingExtracted,

    #[error("select at least one extracted field to include in the credential")]
    NoFieldsSelected,

    #[error("could not identify document type from uploaded file")]
    UnrecognizedDocument,

    #[error("wrong document uploaded: selected {selected}, detected {detected}")]
    DocumentTypeMismatch {
        selected: DocumentType,
        detected: String,
    },

    #[error("field {0} is not part of the selected document schema")]
    UnknownField(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures producing a disclosure view.
#[derive(Debug, Error)]
pub enum DisclosureError {
    #[error("credential is revoked; disclosure refused")]
    Revoked,

    #[error("failed to fetch credential payload: {0}")]
    Fetch(#[from] StorageError),
}

/// Failures in claim-request and attestation flows.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("enter a claim reason first")]
    BlankReason,

    #[error("enter attestation text first")]
    BlankText,

    #[error("a claim request must name at least one field")]
    NoFields,

    #[error("claim request {0} not found")]
    RequestNotFound(u64),

    #[error("claim request {0} is already fulfilled")]
    AlreadyFulfilled(u64),

    #[error("credential {0} is not held by this account")]
    CredentialNotFound(Fingerprint),

    #[error("authentication denied: {0}")]
    AuthDenied(String),

    #[error(transparent)]
    Disclosure(#[from] DisclosureError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
