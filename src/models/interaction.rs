// src/models/interaction.rs
//! Claim requests and attestations exchanged through the interaction hub.

use crate::blockchain::eth_client::to_u64;
use crate::error::LedgerError;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Fields a verifier may ask for in a claim request.
pub const CLAIM_REQUEST_FIELD_OPTIONS: [(&str, &str); 4] = [
    ("Name", "name"),
    ("Document Type", "type"),
    ("Year", "year"),
    ("Document CID", "documentCid"),
];

/// Default fields requested when the caller does not choose any.
pub const DEFAULT_CLAIM_FIELDS: [&str; 2] = ["type", "year"];

/// A verifier's on-chain request for specific fields of a holder's credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub id: u64,
    pub requester: Address,
    pub subject: Address,
    pub fields: Vec<String>,
    pub purpose: String,
    pub fulfilled: bool,
    pub created_at: u64,
}

impl ClaimRequest {
    /// Builds a request from the `claimRequests(uint256)` return layout.
    pub fn from_tuple(
        (id, requester, subject, fields, purpose, fulfilled, created_at): (
            U256,
            Address,
            Address,
            Vec<String>,
            String,
            bool,
            U256,
        ),
    ) -> Result<Self, LedgerError> {
        Ok(ClaimRequest {
            id: to_u64("id", id)?,
            requester,
            subject,
            fields,
            purpose,
            fulfilled,
            created_at: to_u64("createdAt", created_at)?,
        })
    }
}

/// Free-text statement one address makes about another.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub issuer: Address,
    pub subject: Address,
    pub text: String,
    pub created_at: u64,
}

impl Attestation {
    pub fn from_tuple(
        (issuer, subject, text, created_at): (Address, Address, String, U256),
    ) -> Result<Self, LedgerError> {
        Ok(Attestation {
            issuer,
            subject,
            text,
            created_at: to_u64("createdAt", created_at)?,
        })
    }
}

/// Returns true if `field` is one of the claimable field keys.
pub fn is_claimable_field(field: &str) -> bool {
    CLAIM_REQUEST_FIELD_OPTIONS.iter().any(|(_, key)| *key == field)
}
