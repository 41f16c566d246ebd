// src/models/credential.rs
//! Credential data models.
//!
//! Three views of a credential exist:
//! - [`CredentialPayload`]: the typed document an issuer builds and pins
//! - [`PayloadDocument`]: whatever JSON comes back from storage, normalized
//! - [`CredentialRecord`]: the on-ledger anchor (fingerprint + content address)

use crate::blockchain::eth_client::to_u64;
use crate::error::LedgerError;
use crate::utils::crypto::Fingerprint;
use chrono::{DateTime, SecondsFormat, Utc};
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key under which some producers nest the credential body.
pub const WRAPPER_KEY: &str = "credential";

/// The off-ledger credential document produced at issuance time.
///
/// Serialized field names follow the JSON layout the dashboard pins to IPFS.
/// Once fingerprinted the payload must not be mutated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    /// Primary subject name (may be empty)
    pub name: String,

    /// Document type label, e.g. "Passport"
    #[serde(rename = "type")]
    pub credential_type: String,

    /// Year of record (may be empty)
    pub year: String,

    /// Same label as `type`, kept for consumers that read `documentType`
    pub document_type: String,

    /// Confirmed document attributes
    pub fields: BTreeMap<String, String>,

    /// Content address of the separately pinned source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_cid: Option<String>,

    /// Original file name of the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,

    /// Recipient address (`0x` hex)
    pub issued_to: String,

    /// RFC 3339 issuance time
    pub timestamp: String,
}

impl CredentialPayload {
    /// Formats an issuance time the way payloads store it.
    pub fn format_timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Converts the typed payload into the normalized document used for hashing.
    pub fn to_document(&self) -> PayloadDocument {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => PayloadDocument(map),
            _ => PayloadDocument::default(),
        }
    }
}

/// Shape of a JSON payload as fetched from storage.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadShape {
    /// `{"credential": {...}}` with no sibling keys
    Wrapped(Map<String, Value>),
    /// Any other JSON object
    Flat(Map<String, Value>),
    /// Not a JSON object at all
    Malformed,
}

impl PayloadShape {
    /// Any key next to `credential` makes the object flat, so every byte
    /// served by storage stays covered by the fingerprint.
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Object(map) => match map.get(WRAPPER_KEY) {
                Some(Value::Object(inner)) if map.len() == 1 => PayloadShape::Wrapped(inner.clone()),
                _ => PayloadShape::Flat(map.clone()),
            },
            _ => PayloadShape::Malformed,
        }
    }

    /// Parses raw bytes; invalid JSON is `Malformed`.
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::classify(&value),
            Err(_) => PayloadShape::Malformed,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, PayloadShape::Malformed)
    }
}

/// Normalized credential body: a JSON object with any wrapper removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadDocument(Map<String, Value>);

impl PayloadDocument {
    /// Normalizes any JSON value. Non-objects become an empty document.
    pub fn normalize(value: &Value) -> Self {
        PayloadShape::classify(value).into()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of `key` if present and non-blank.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Display title: document name, then subject name.
    pub fn title(&self) -> &str {
        self.text("documentName")
            .or_else(|| self.text("name"))
            .unwrap_or("Unnamed Credential")
    }

    /// Document type label from `type`, falling back to `documentType`.
    pub fn credential_type(&self) -> Option<&str> {
        self.text("type").or_else(|| self.text("documentType"))
    }
}

impl From<PayloadShape> for PayloadDocument {
    fn from(shape: PayloadShape) -> Self {
        match shape {
            PayloadShape::Wrapped(map) | PayloadShape::Flat(map) => PayloadDocument(map),
            PayloadShape::Malformed => PayloadDocument::default(),
        }
    }
}

/// On-ledger credential record as returned by `getUserCredentials`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub credential_hash: Fingerprint,
    #[serde(rename = "ipfsCID")]
    pub ipfs_cid: String,
    pub issuer: Address,
    pub is_valid: bool,
    /// Unix seconds
    pub issued_at: u64,
}

impl CredentialRecord {
    /// Builds a record from the contract's tuple layout.
    pub fn from_tuple(
        (hash, cid, issuer, is_valid, issued_at): (H256, String, Address, bool, U256),
    ) -> Result<Self, LedgerError> {
        Ok(CredentialRecord {
            credential_hash: hash.into(),
            ipfs_cid: cid,
            issuer,
            is_valid,
            issued_at: to_u64("issuedAt", issued_at)?,
        })
    }
}

/// Result of an integrity check.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Fingerprint matches and the record is valid
    Authentic,
    /// Fetched payload hashes to something other than the anchored fingerprint
    Tampered {
        expected: Fingerprint,
        actual: Fingerprint,
    },
    /// Validity flag is false on the ledger
    Revoked,
    /// Payload could not be fetched or read; retrying is safe
    FetchFailed { reason: String },
}

impl VerificationOutcome {
    pub fn is_authentic(&self) -> bool {
        matches!(self, VerificationOutcome::Authentic)
    }

    pub fn label(&self) -> &'static str {
        match self {
            VerificationOutcome::Authentic => "Credential Verified (Authentic)",
            VerificationOutcome::Tampered { .. } => "Credential Tampered",
            VerificationOutcome::Revoked => "Credential Revoked",
            VerificationOutcome::FetchFailed { .. } => "Failed to fetch IPFS document",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> CredentialPayload {
        CredentialPayload {
            name: "Alice".into(),
            credential_type: "Passport".into(),
            year: "2025".into(),
            document_type: "Passport".into(),
            fields: BTreeMap::from([("full_name".to_string(), "Alice".to_string())]),
            document_cid: None,
            document_name: Some("passport.pdf".into()),
            issued_to: "0x0000000000000000000000000000000000000001".into(),
            timestamp: "2025-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn payload_uses_dashboard_field_names() {
        let value = serde_json::to_value(sample_payload()).unwrap();
        assert_eq!(value["type"], "Passport");
        assert_eq!(value["documentType"], "Passport");
        assert_eq!(value["issuedTo"], "0x0000000000000000000000000000000000000001");
        assert_eq!(value["documentName"], "passport.pdf");
        assert!(value.get("documentCid").is_none());
    }

    #[test]
    fn classifies_wrapped_flat_and_malformed() {
        assert!(matches!(
            PayloadShape::classify(&json!({"credential": {"type": "PAN"}})),
            PayloadShape::Wrapped(_)
        ));
        assert!(matches!(
            PayloadShape::classify(&json!({"type": "PAN"})),
            PayloadShape::Flat(_)
        ));
        // a non-object wrapper value is just a flat field
        assert!(matches!(
            PayloadShape::classify(&json!({"credential": "PAN"})),
            PayloadShape::Flat(_)
        ));
        // siblings of the wrapper keep the whole object in play
        let padded = json!({"credential": {"type": "PAN"}, "isValid": true});
        assert_eq!(
            PayloadShape::classify(&padded),
            PayloadShape::Flat(padded.as_object().unwrap().clone())
        );
        assert!(PayloadShape::classify(&json!("text")).is_malformed());
        assert!(PayloadShape::classify(&Value::Null).is_malformed());
        assert!(PayloadShape::parse(b"{not json").is_malformed());
    }

    #[test]
    fn wrapped_and_flat_normalize_identically() {
        let flat = PayloadDocument::normalize(&json!({"type": "PAN", "year": "2020"}));
        let wrapped = PayloadDocument::normalize(&json!({"credential": {"year": "2020", "type": "PAN"}}));
        assert_eq!(flat, wrapped);
    }

    #[test]
    fn title_falls_back_through_names() {
        let doc = PayloadDocument::normalize(&json!({"documentName": " ", "name": "Bob"}));
        assert_eq!(doc.title(), "Bob");
        assert_eq!(PayloadDocument::default().title(), "Unnamed Credential");
        let typed = PayloadDocument::normalize(&json!({"type": "", "documentType": "PAN"}));
        assert_eq!(typed.credential_type(), Some("PAN"));
    }

    #[test]
    fn record_from_contract_tuple() {
        let record = CredentialRecord::from_tuple((
            H256::repeat_byte(0xab),
            "QmCid".into(),
            Address::repeat_byte(0x11),
            true,
            U256::from(1_700_000_000u64),
        ))
        .unwrap();
        assert_eq!(record.issued_at, 1_700_000_000);
        assert_eq!(record.credential_hash.as_bytes(), &[0xab; 32]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ipfsCID"], "QmCid");
        assert_eq!(json["isValid"], true);
    }

    #[test]
    fn oversized_issue_time_is_rejected() {
        let result = CredentialRecord::from_tuple((
            H256::zero(),
            "QmCid".into(),
            Address::zero(),
            true,
            U256::MAX,
        ));
        assert!(matches!(result, Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(VerificationOutcome::Revoked).unwrap();
        assert_eq!(json, json!({"status": "revoked"}));
        let failed = VerificationOutcome::FetchFailed { reason: "timeout".into() };
        assert_eq!(serde_json::to_value(failed).unwrap()["reason"], "timeout");
    }
}
