// src/models/document.rs
//! Supported source document types and the fields extracted from each.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document types the issuer can turn into credentials.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    #[serde(rename = "10th Marksheet")]
    TenthMarksheet,
    #[serde(rename = "12th Marksheet")]
    TwelfthMarksheet,
    #[serde(rename = "Aadhaar")]
    Aadhaar,
    #[serde(rename = "Passport")]
    Passport,
    #[serde(rename = "PAN")]
    Pan,
    #[serde(rename = "Voter ID")]
    VoterId,
    #[serde(rename = "Driving License")]
    DrivingLicense,
    #[serde(rename = "UG Marksheet")]
    UgMarksheet,
    #[serde(rename = "PG Marksheet")]
    PgMarksheet,
    #[serde(rename = "Diploma Certificate")]
    DiplomaCertificate,
}

impl DocumentType {
    pub const ALL: [DocumentType; 10] = [
        DocumentType::TenthMarksheet,
        DocumentType::TwelfthMarksheet,
        DocumentType::Aadhaar,
        DocumentType::Passport,
        DocumentType::Pan,
        DocumentType::VoterId,
        DocumentType::DrivingLicense,
        DocumentType::UgMarksheet,
        DocumentType::PgMarksheet,
        DocumentType::DiplomaCertificate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DocumentType::TenthMarksheet => "10th Marksheet",
            DocumentType::TwelfthMarksheet => "12th Marksheet",
            DocumentType::Aadhaar => "Aadhaar",
            DocumentType::Passport => "Passport",
            DocumentType::Pan => "PAN",
            DocumentType::VoterId => "Voter ID",
            DocumentType::DrivingLicense => "Driving License",
            DocumentType::UgMarksheet => "UG Marksheet",
            DocumentType::PgMarksheet => "PG Marksheet",
            DocumentType::DiplomaCertificate => "Diploma Certificate",
        }
    }

    /// Field keys extracted for this document type, in display order.
    pub fn schema(self) -> &'static [&'static str] {
        match self {
            DocumentType::TenthMarksheet => &["student_name", "board_name", "roll_number", "year_of_passing"],
            DocumentType::TwelfthMarksheet => &["student_name", "board_name", "roll_number", "stream"],
            DocumentType::Aadhaar => &["full_name", "aadhaar_number", "date_of_birth", "gender", "address"],
            DocumentType::Passport => &[
                "full_name",
                "passport_number",
                "nationality",
                "date_of_birth",
                "date_of_expiry",
            ],
            DocumentType::Pan => &["full_name", "pan_number", "date_of_birth", "father_name"],
            DocumentType::VoterId => &["full_name", "voter_id_number", "gender", "address"],
            DocumentType::DrivingLicense => &[
                "full_name",
                "license_number",
                "date_of_birth",
                "date_of_expiry",
                "vehicle_class",
            ],
            DocumentType::UgMarksheet | DocumentType::PgMarksheet => &[
                "student_name",
                "university_name",
                "registration_number",
                "course_name",
                "cgpa_or_percentage",
            ],
            DocumentType::DiplomaCertificate => &[
                "student_name",
                "institute_name",
                "certificate_number",
                "course_name",
                "year_of_passing",
            ],
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported document type: {0}")]
pub struct UnknownDocumentType(pub String);

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_document_type(s).ok_or_else(|| UnknownDocumentType(s.to_string()))
    }
}

fn squash(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Maps a free-form type guess (e.g. from the extraction service) onto a
/// supported document type.
///
/// Keyword rules are checked in a fixed order, so "12th" wins over the "ug"
/// substring and so on; an exact label match is the last resort.
pub fn normalize_document_type(raw: &str) -> Option<DocumentType> {
    let normalized = squash(raw);
    if normalized.is_empty() {
        return None;
    }
    let has = |needle: &str| normalized.contains(needle);

    if has("10th") || (has("secondary") && !has("highersecondary")) {
        return Some(DocumentType::TenthMarksheet);
    }
    if has("12th") || has("highersecondary") {
        return Some(DocumentType::TwelfthMarksheet);
    }
    if has("aadhaar") || has("aadhar") {
        return Some(DocumentType::Aadhaar);
    }
    if has("passport") {
        return Some(DocumentType::Passport);
    }
    if normalized == "pan" || has("pancard") {
        return Some(DocumentType::Pan);
    }
    if has("voter") {
        return Some(DocumentType::VoterId);
    }
    if has("drivinglicense") || has("dl") {
        return Some(DocumentType::DrivingLicense);
    }
    if has("ug") || has("bachelor") {
        return Some(DocumentType::UgMarksheet);
    }
    if has("pg") || has("master") {
        return Some(DocumentType::PgMarksheet);
    }
    if has("diploma") {
        return Some(DocumentType::DiplomaCertificate);
    }

    DocumentType::ALL
        .into_iter()
        .find(|doc_type| squash(doc_type.label()) == normalized)
}

/// `date_of_birth` -> `Date Of Birth`
pub fn format_field_label(field_key: &str) -> String {
    field_key
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
