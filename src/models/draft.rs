// src/models/draft.rs
//! Issuer form state as an explicit view model.
//!
//! An `IssuanceDraft` lives for one issuing interaction. Handlers take the
//! draft by reference, update it, and report validation problems as
//! [`IssueError`] values; nothing here performs I/O.

use crate::error::IssueError;
use crate::models::credential::CredentialPayload;
use crate::models::document::{normalize_document_type, DocumentType};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use ethers::types::Address;
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A source document chosen for issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        DocumentUpload {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Best-effort guess returned by the extraction service.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Per-interaction issuer state.
#[derive(Debug, Clone)]
pub struct IssuanceDraft {
    document_type: DocumentType,
    extracted_fields: BTreeMap<String, String>,
    selected_keys: Vec<String>,
    recipient: String,
    upload: Option<DocumentUpload>,
}

impl IssuanceDraft {
    pub fn new(document_type: DocumentType) -> Self {
        IssuanceDraft {
            document_type,
            extracted_fields: BTreeMap::new(),
            selected_keys: Vec::new(),
            recipient: String::new(),
            upload: None,
        }
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn extracted_fields(&self) -> &BTreeMap<String, String> {
        &self.extracted_fields
    }

    pub fn selected_keys(&self) -> &[String] {
        &self.selected_keys
    }

    pub fn upload(&self) -> Option<&DocumentUpload> {
        self.upload.as_ref()
    }

    /// Switching type discards anything extracted for the previous type.
    pub fn select_document_type(&mut self, document_type: DocumentType) {
        self.document_type = document_type;
        self.extracted_fields.clear();
        self.selected_keys.clear();
    }

    pub fn attach(&mut self, upload: DocumentUpload) {
        self.upload = Some(upload);
        self.extracted_fields.clear();
        self.selected_keys.clear();
    }

    pub fn set_recipient(&mut self, recipient: impl Into<String>) {
        self.recipient = recipient.into();
    }

    /// Applies an extraction result.
    ///
    /// The detected type must match the selected one. Schema fields are
    /// pre-filled (missing ones as empty strings) and every field that came
    /// back with a value is pre-selected.
    pub fn apply_extraction(&mut self, extracted: &ExtractedDocument) -> Result<(), IssueError> {
        let detected = match normalize_document_type(&extracted.document_type) {
            Some(detected) => detected,
            None => {
                self.extracted_fields.clear();
                self.selected_keys.clear();
                return Err(IssueError::UnrecognizedDocument);
            }
        };
        if detected != self.document_type {
            self.extracted_fields.clear();
            self.selected_keys.clear();
            return Err(IssueError::DocumentTypeMismatch {
                selected: self.document_type,
                detected: detected.label().to_string(),
            });
        }

        let schema = self.document_type.schema();
        self.extracted_fields = schema
            .iter()
            .map(|key| {
                let value = extracted.fields.get(*key).cloned().unwrap_or_default();
                (key.to_string(), value)
            })
            .collect();
        self.select_filled();
        Ok(())
    }

    /// Selects every schema field that currently has a non-blank value.
    pub fn select_filled(&mut self) {
        self.selected_keys = self
            .document_type
            .schema()
            .iter()
            .filter(|key| {
                self.extracted_fields
                    .get(**key)
                    .map_or(false, |v| !v.trim().is_empty())
            })
            .map(|key| key.to_string())
            .collect();
    }

    /// Replaces the selection with `keys`. Keys outside the schema are rejected
    /// and leave the selection untouched.
    pub fn select_only<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<(), IssueError> {
        let schema = self.document_type.schema();
        let mut selected: Vec<String> = Vec::with_capacity(keys.len());
        for key in keys.iter().map(AsRef::as_ref) {
            if !schema.contains(&key) {
                return Err(IssueError::UnknownField(key.to_string()));
            }
            if !selected.iter().any(|k| k == key) {
                selected.push(key.to_string());
            }
        }
        self.selected_keys = selected;
        Ok(())
    }

    /// Manual correction of an extracted value.
    pub fn set_field(&mut self, key: &str, value: impl Into<String>) -> Result<(), IssueError> {
        if !self.document_type.schema().contains(&key) {
            return Err(IssueError::UnknownField(key.to_string()));
        }
        self.extracted_fields.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Adds or removes a field from the selection; returns whether it is now selected.
    pub fn toggle_field(&mut self, key: &str) -> Result<bool, IssueError> {
        if !self.document_type.schema().contains(&key) {
            return Err(IssueError::UnknownField(key.to_string()));
        }
        if let Some(pos) = self.selected_keys.iter().position(|k| k == key) {
            self.selected_keys.remove(pos);
            Ok(false)
        } else {
            self.selected_keys.push(key.to_string());
            Ok(true)
        }
    }

    /// Recipient address, falling back to the issuer when blank or invalid.
    pub fn target_address(&self, issuer: Address) -> Address {
        self.recipient.trim().parse::<Address>().unwrap_or(issuer)
    }

    /// Validates the draft and builds the payload to be hashed and pinned.
    pub fn build_payload(
        &self,
        issuer: Address,
        document_cid: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CredentialPayload, IssueError> {
        let upload = self.upload.as_ref().ok_or(IssueError::NoDocument)?;

        let has_any_value = self
            .document_type
            .schema()
            .iter()
            .any(|key| self.extracted_fields.get(*key).map_or(false, |v| !v.trim().is_empty()));
        if !has_any_value {
            return Err(IssueError::NothingExtracted);
        }

        let fields: BTreeMap<String, String> = self
            .selected_keys
            .iter()
            .filter_map(|key| {
                let value = self.extracted_fields.get(key)?.trim();
                (!value.is_empty()).then(|| (key.clone(), value.to_string()))
            })
            .collect();
        if fields.is_empty() {
            return Err(IssueError::NoFieldsSelected);
        }

        let first_of = |keys: &[&str]| -> String {
            keys.iter()
                .find_map(|k| fields.get(*k).cloned())
                .unwrap_or_default()
        };
        let label = self.document_type.label().to_string();

        Ok(CredentialPayload {
            name: first_of(&["full_name", "student_name"]),
            credential_type: label.clone(),
            year: first_of(&["year_of_passing", "date_of_birth"]),
            document_type: label,
            document_cid,
            document_name: Some(upload.file_name.clone()),
            issued_to: to_checksum(&self.target_address(issuer), None),
            timestamp: CredentialPayload::format_timestamp(now),
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn passport_extraction() -> ExtractedDocument {
        ExtractedDocument {
            document_type: "passport".into(),
            name: "Jane Doe".into(),
            year: "2021".into(),
            fields: BTreeMap::from([
                ("full_name".to_string(), " Jane Doe ".to_string()),
                ("passport_number".to_string(), "P1234567".to_string()),
                ("nationality".to_string(), "".to_string()),
                ("date_of_birth".to_string(), "1990-01-01".to_string()),
                ("unrelated".to_string(), "ignored".to_string()),
            ]),
        }
    }

    fn draft_with_upload() -> IssuanceDraft {
        let mut draft = IssuanceDraft::new(DocumentType::Passport);
        draft.attach(DocumentUpload::new("passport.pdf", "application/pdf", &b"%PDF"[..]));
        draft
    }

    fn issuer() -> Address {
        Address::repeat_byte(0x22)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn extraction_prefills_schema_and_selects_non_blank() {
        let mut draft = draft_with_upload();
        draft.apply_extraction(&passport_extraction()).unwrap();

        assert_eq!(draft.extracted_fields().len(), DocumentType::Passport.schema().len());
        assert!(!draft.extracted_fields().contains_key("unrelated"));
        assert_eq!(draft.extracted_fields()["date_of_expiry"], "");
        assert_eq!(
            draft.selected_keys(),
            &["full_name".to_string(), "passport_number".to_string(), "date_of_birth".to_string()]
        );
    }

    #[test]
    fn mismatched_type_is_rejected_and_clears_fields() {
        let mut draft = IssuanceDraft::new(DocumentType::Pan);
        let err = draft.apply_extraction(&passport_extraction()).unwrap_err();
        assert!(matches!(
            err,
            IssueError::DocumentTypeMismatch { selected: DocumentType::Pan, ref detected } if detected == "Passport"
        ));
        assert!(draft.extracted_fields().is_empty());
    }

    #[test]
    fn unrecognized_type_is_rejected() {
        let mut draft = draft_with_upload();
        let guess = ExtractedDocument { document_type: "Hospital Bill".into(), ..Default::default() };
        assert!(matches!(draft.apply_extraction(&guess), Err(IssueError::UnrecognizedDocument)));
    }

    #[test]
    fn payload_derives_name_and_year_and_trims() {
        let mut draft = draft_with_upload();
        draft.apply_extraction(&passport_extraction()).unwrap();
        let payload = draft.build_payload(issuer(), Some("QmDoc".into()), now()).unwrap();

        assert_eq!(payload.name, "Jane Doe");
        assert_eq!(payload.year, "1990-01-01");
        assert_eq!(payload.credential_type, "Passport");
        assert_eq!(payload.document_type, "Passport");
        assert_eq!(payload.fields["full_name"], "Jane Doe");
        assert!(!payload.fields.contains_key("nationality"));
        assert_eq!(payload.document_cid.as_deref(), Some("QmDoc"));
        assert_eq!(payload.document_name.as_deref(), Some("passport.pdf"));
        assert_eq!(payload.timestamp, "2025-03-01T12:00:00.000Z");
    }

    #[test]
    fn recipient_falls_back_to_issuer() {
        let mut draft = draft_with_upload();
        draft.set_recipient("not-an-address");
        assert_eq!(draft.target_address(issuer()), issuer());
        draft.set_recipient("0x1111111111111111111111111111111111111111");
        assert_eq!(draft.target_address(issuer()), Address::repeat_byte(0x11));
    }

    #[test]
    fn validation_order_matches_issuer_flow() {
        let mut no_file = IssuanceDraft::new(DocumentType::Passport);
        no_file.set_field("full_name", "Jane").unwrap();
        assert!(matches!(no_file.build_payload(issuer(), None, now()), Err(IssueError::NoDocument)));

        let draft = draft_with_upload();
        assert!(matches!(draft.build_payload(issuer(), None, now()), Err(IssueError::NothingExtracted)));

        let mut deselected = draft_with_upload();
        deselected.apply_extraction(&passport_extraction()).unwrap();
        for key in deselected.selected_keys().to_vec() {
            assert!(!deselected.toggle_field(&key).unwrap());
        }
        assert!(matches!(
            deselected.build_payload(issuer(), None, now()),
            Err(IssueError::NoFieldsSelected)
        ));
    }

    #[test]
    fn fields_outside_schema_are_rejected() {
        let mut draft = draft_with_upload();
        assert!(matches!(draft.toggle_field("roll_number"), Err(IssueError::UnknownField(_))));
        assert!(draft.set_field("nationality", "Indian").is_ok());
    }

    #[test]
    fn manual_fields_can_be_selected_explicitly_or_by_value() {
        let mut draft = draft_with_upload();
        draft.set_field("full_name", "Jane Doe").unwrap();
        draft.set_field("nationality", "  ").unwrap();
        draft.select_filled();
        assert_eq!(draft.selected_keys(), &["full_name".to_string()]);

        draft.select_only(&["nationality", "full_name", "nationality"]).unwrap();
        assert_eq!(draft.selected_keys(), &["nationality".to_string(), "full_name".to_string()]);

        assert!(matches!(draft.select_only(&["pan_number"]), Err(IssueError::UnknownField(_))));
        assert_eq!(draft.selected_keys().len(), 2);
    }

    #[test]
    fn changing_type_resets_extraction() {
        let mut draft = draft_with_upload();
        draft.apply_extraction(&passport_extraction()).unwrap();
        draft.select_document_type(DocumentType::Aadhaar);
        assert!(draft.extracted_fields().is_empty());
        assert!(draft.selected_keys().is_empty());
        assert!(draft.upload().is_some());
    }
}
