// src/services/extraction.rs
//! Document field extraction through a hosted LLM.
//!
//! The result is a suggestion. The issuance draft checks the detected type
//! against the one the issuer selected and the issuer confirms every field.

use crate::error::ExtractionError;
use crate::models::document::DocumentType;
use crate::models::draft::{DocumentUpload, ExtractedDocument};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Classifies `upload` and pulls out the fields of `expected`'s schema.
    async fn extract(
        &self,
        upload: &DocumentUpload,
        expected: DocumentType,
    ) -> Result<ExtractedDocument, ExtractionError>;
}

/// Builds the classification prompt for one upload.
pub fn extraction_prompt(expected: DocumentType) -> String {
    let types = DocumentType::ALL
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join(", ");
    let fields = expected
        .schema()
        .iter()
        .map(|key| format!("\"{}\": \"\"", key))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are a strict document classifier and extractor.\n\
         Identify document type: {types}\n\
         Extract: documentType, name, year, and these fields when visible: {keys}\n\
         Return ONLY valid JSON: {{ \"documentType\": \"\", \"name\": \"\", \"year\": \"\", \"fields\": {{ {fields} }} }}\n",
        types = types,
        keys = expected.schema().join(", "),
        fields = fields,
    )
}

/// Removes a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let without_open = trimmed.trim_start_matches("```");
    let without_lang = without_open
        .strip_prefix("json")
        .or_else(|| without_open.strip_prefix("JSON"))
        .unwrap_or(without_open);
    without_lang.trim_end().trim_end_matches("```").trim()
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then(|| text)
    }
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiExtractor {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiExtractor {
    pub fn new(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        Ok(GeminiExtractor {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl DocumentExtractor for GeminiExtractor {
    async fn extract(
        &self,
        upload: &DocumentUpload,
        expected: DocumentType,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let api_key = self.api_key.as_deref().ok_or(ExtractionError::MissingApiKey)?;
        let mime_type = if upload.mime_type.trim().is_empty() {
            "application/pdf"
        } else {
            upload.mime_type.as_str()
        };

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": extraction_prompt(expected) },
                    { "inlineData": { "mimeType": mime_type, "data": base64::encode(&upload.bytes) } }
                ]
            }]
        });

        info!("extracting {} ({} bytes) as {}", upload.file_name, upload.bytes.len(), expected);
        let response = self
            .http
            .post(format!("{}/v1beta/models/{}:generateContent", self.api_url, self.model))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExtractionError::QuotaExceeded);
        }
        if !status.is_success() {
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed.text().ok_or(ExtractionError::EmptyResponse)?;
        debug!("extraction output: {}", text);
        Ok(serde_json::from_str(strip_code_fence(&text))?)
    }
}
