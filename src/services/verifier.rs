// src/services/verifier.rs
//! Credential verification.
//!
//! [`IntegrityChecker`] answers one question per record: does the payload
//! behind `ipfs_cid` still hash to the anchored fingerprint? [`Verifier`]
//! wraps it with the ledger read and the issuer trust lookup.

use crate::contracts::{CredentialLedger, TrustRegistry};
use crate::error::LedgerError;
use crate::models::credential::{CredentialRecord, PayloadDocument, PayloadShape, VerificationOutcome};
use crate::storage::ContentStore;
use crate::utils::crypto::fingerprint;
use ethers::types::Address;
use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Re-derives fingerprints from stored payloads and compares them with the
/// ledger. Holds no mutable state; checks may run concurrently.
#[derive(Clone)]
pub struct IntegrityChecker {
    store: Arc<dyn ContentStore>,
}

impl IntegrityChecker {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        IntegrityChecker { store }
    }

    /// Checks a single record.
    ///
    /// Revoked records are reported without touching storage. Fetch and
    /// decode problems become `FetchFailed`; they never look like tampering.
    pub async fn check(&self, record: &CredentialRecord) -> VerificationOutcome {
        if !record.is_valid {
            debug!("{} is revoked; skipping fetch", record.credential_hash);
            return VerificationOutcome::Revoked;
        }

        let bytes = match self.store.fetch(&record.ipfs_cid).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("fetching {} failed: {}", record.ipfs_cid, e);
                return VerificationOutcome::FetchFailed { reason: e.to_string() };
            }
        };

        let shape = PayloadShape::parse(&bytes);
        if shape.is_malformed() {
            warn!("payload at {} is not a JSON object", record.ipfs_cid);
            return VerificationOutcome::FetchFailed {
                reason: "payload is not a JSON object".to_string(),
            };
        }

        let actual = fingerprint(&PayloadDocument::from(shape));
        if actual == record.credential_hash {
            debug!("{} is authentic", record.credential_hash);
            VerificationOutcome::Authentic
        } else {
            warn!(
                "fingerprint mismatch for {}: anchored {}, recomputed {}",
                record.ipfs_cid, record.credential_hash, actual
            );
            VerificationOutcome::Tampered {
                expected: record.credential_hash,
                actual,
            }
        }
    }

    /// Checks many records concurrently. Results keep input order.
    pub async fn check_all(&self, records: &[CredentialRecord]) -> Vec<VerificationOutcome> {
        join_all(records.iter().map(|record| self.check(record))).await
    }
}

/// One verified record with its outcome.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub record: CredentialRecord,
    pub outcome: VerificationOutcome,
    /// Only set for authentic records; `None` when the registry could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_trusted: Option<bool>,
}

/// Ledger-backed verification of everything an address holds.
pub struct Verifier {
    ledger: Arc<dyn CredentialLedger>,
    trust: Arc<dyn TrustRegistry>,
    checker: IntegrityChecker,
}

impl Verifier {
    pub fn new(
        ledger: Arc<dyn CredentialLedger>,
        trust: Arc<dyn TrustRegistry>,
        checker: IntegrityChecker,
    ) -> Self {
        Verifier { ledger, trust, checker }
    }

    pub fn checker(&self) -> &IntegrityChecker {
        &self.checker
    }

    /// Verifies a record supplied by the caller.
    pub async fn verify_record(&self, record: CredentialRecord) -> VerificationReport {
        let outcome = self.checker.check(&record).await;
        let issuer_trusted = if outcome.is_authentic() {
            self.issuer_trusted(record.issuer).await
        } else {
            None
        };
        VerificationReport {
            record,
            outcome,
            issuer_trusted,
        }
    }

    /// Reads every record anchored for `owner` and verifies each one.
    pub async fn verify_owner(&self, owner: Address) -> Result<Vec<VerificationReport>, LedgerError> {
        let records = self.ledger.get_user_credentials(owner).await?;
        info!("verifying {} credential(s) for {:?}", records.len(), owner);
        Ok(join_all(records.into_iter().map(|record| self.verify_record(record))).await)
    }

    async fn issuer_trusted(&self, issuer: Address) -> Option<bool> {
        match self.trust.is_trusted(issuer).await {
            Ok(trusted) => Some(trusted),
            Err(e) => {
                warn!("trust lookup for {:?} failed: {}", issuer, e);
                None
            }
        }
    }
}
