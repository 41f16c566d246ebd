// src/services/disclosure.rs
//! Selective disclosure of credential payload fields.
//!
//! The filter is pure: allow-listed keys that carry a value pass through,
//! everything else is dropped. Refusing revoked credentials is the caller's
//! job; [`DisclosureService`] does that before it fetches anything.

use crate::error::DisclosureError;
use crate::models::credential::{CredentialRecord, PayloadDocument, PayloadShape};
use crate::models::interaction::ClaimRequest;
use crate::storage::ContentStore;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Field names a verifier may see, in the order they were given.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct DisclosureAllowList(Vec<String>);

impl DisclosureAllowList {
    /// Builds a list from names; blanks and duplicates are dropped.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into().trim().to_string();
            if !field.is_empty() && !list.contains(&field) {
                list.push(field);
            }
        }
        DisclosureAllowList(list)
    }

    /// What anonymous public verification may reveal.
    pub fn public() -> Self {
        Self::new(["type", "documentType", "year"])
    }

    /// Exactly the fields a claim request asked for.
    pub fn claim_request(request: &ClaimRequest) -> Self {
        Self::new(request.fields.iter().cloned())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Filters a normalized document.
pub fn disclose_document(document: &PayloadDocument, allow: &DisclosureAllowList) -> BTreeMap<String, Value> {
    allow
        .fields()
        .iter()
        .filter_map(|key| {
            let value = document.get(key)?;
            has_content(value).then(|| (key.clone(), value.clone()))
        })
        .collect()
}

/// Filters any JSON payload, flat or wrapped. Non-objects disclose nothing.
pub fn disclose(payload: &Value, allow: &DisclosureAllowList) -> BTreeMap<String, Value> {
    disclose_document(&PayloadDocument::normalize(payload), allow)
}

/// Fetches payloads and produces disclosure views of ledger records.
#[derive(Clone)]
pub struct DisclosureService {
    store: Arc<dyn ContentStore>,
}

impl DisclosureService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        DisclosureService { store }
    }

    pub async fn disclose_record(
        &self,
        record: &CredentialRecord,
        allow: &DisclosureAllowList,
    ) -> Result<BTreeMap<String, Value>, DisclosureError> {
        if !record.is_valid {
            return Err(DisclosureError::Revoked);
        }
        let bytes = self.store.fetch(&record.ipfs_cid).await?;
        let document = PayloadDocument::from(PayloadShape::parse(&bytes));
        let view = disclose_document(&document, allow);
        debug!(
            "disclosed {} of {} allowed field(s) from {}",
            view.len(),
            allow.fields().len(),
            record.ipfs_cid
        );
        Ok(view)
    }
}
