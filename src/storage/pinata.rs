// src/storage/pinata.rs
//! Pinata pinning service plus public IPFS gateways.
//!
//! Pinning needs either a JWT or an API key/secret pair. Fetching needs no
//! credentials: gateways are tried in order and the first success wins.

use super::ContentStore;
use crate::error::StorageError;
use crate::models::draft::DocumentUpload;
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.pinata.cloud";
pub const DEFAULT_GATEWAYS: [&str; 2] = ["https://gateway.pinata.cloud/ipfs", "https://ipfs.io/ipfs"];

/// Pinning credentials.
#[derive(Clone)]
pub enum PinataAuth {
    Jwt(String),
    ApiKey { key: String, secret: String },
}

impl PinataAuth {
    /// Picks JWT when present, otherwise key + secret; `None` when neither is complete.
    pub fn from_parts(jwt: Option<String>, key: Option<String>, secret: Option<String>) -> Option<Self> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        if let Some(jwt) = non_blank(jwt) {
            return Some(PinataAuth::Jwt(jwt));
        }
        match (non_blank(key), non_blank(secret)) {
            (Some(key), Some(secret)) => Some(PinataAuth::ApiKey { key, secret }),
            _ => None,
        }
    }

    fn headers(&self) -> Result<HeaderMap, StorageError> {
        let value = |s: &str| HeaderValue::from_str(s).map_err(|_| StorageError::MissingCredentials);
        let mut headers = HeaderMap::new();
        match self {
            PinataAuth::Jwt(jwt) => {
                headers.insert(AUTHORIZATION, value(&format!("Bearer {}", jwt))?);
            }
            PinataAuth::ApiKey { key, secret } => {
                headers.insert("pinata_api_key", value(key)?);
                headers.insert("pinata_secret_api_key", value(secret)?);
            }
        }
        Ok(headers)
    }
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: Option<String>,
}

/// HTTP client for Pinata pinning and gateway retrieval.
#[derive(Clone)]
pub struct PinataClient {
    http: reqwest::Client,
    api_url: String,
    auth: Option<PinataAuth>,
    gateways: Vec<String>,
}

impl PinataClient {
    pub fn new(
        api_url: impl Into<String>,
        auth: Option<PinataAuth>,
        gateways: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(PinataClient {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            auth,
            gateways: gateways
                .into_iter()
                .map(|g| g.trim_end_matches('/').to_string())
                .collect(),
        })
    }

    pub fn gateways(&self) -> &[String] {
        &self.gateways
    }

    fn auth_headers(&self) -> Result<HeaderMap, StorageError> {
        self.auth
            .as_ref()
            .ok_or(StorageError::MissingCredentials)?
            .headers()
    }

    async fn read_cid(response: Response) -> Result<String, StorageError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(StorageError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: PinResponse = response.json().await?;
        parsed.ipfs_hash.ok_or(StorageError::MissingCid)
    }

    async fn fetch_from(&self, gateway: &str, cid: &str) -> Result<Bytes, StorageError> {
        let response = self.http.get(format!("{}/{}", gateway, cid)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl ContentStore for PinataClient {
    async fn pin_json(&self, body: &[u8]) -> Result<String, StorageError> {
        let headers = self.auth_headers()?;
        let response = self
            .http
            .post(format!("{}/pinning/pinJSONToIPFS", self.api_url))
            .headers(headers)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .await?;
        let cid = Self::read_cid(response).await?;
        debug!("pinned {} byte payload as {}", body.len(), cid);
        Ok(cid)
    }

    async fn pin_file(&self, upload: &DocumentUpload) -> Result<String, StorageError> {
        let headers = self.auth_headers()?;
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)?;
        let response = self
            .http
            .post(format!("{}/pinning/pinFileToIPFS", self.api_url))
            .headers(headers)
            .multipart(Form::new().part("file", part))
            .send()
            .await?;
        let cid = Self::read_cid(response).await?;
        debug!("pinned document {} as {}", upload.file_name, cid);
        Ok(cid)
    }

    async fn fetch(&self, cid: &str) -> Result<Bytes, StorageError> {
        let mut last_error = StorageError::NoGateways;
        for gateway in &self.gateways {
            match self.fetch_from(gateway, cid).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    warn!("gateway {} failed for {}: {}", gateway, cid, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, server_url, Matcher};

    fn client(prefix: &str, auth: Option<PinataAuth>, gateways: &[&str]) -> PinataClient {
        PinataClient::new(
            format!("{}/{}", server_url(), prefix),
            auth,
            gateways.iter().map(|g| format!("{}/{}", server_url(), g)).collect(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn auth_prefers_jwt_and_requires_both_key_parts() {
        assert!(matches!(
            PinataAuth::from_parts(Some("jwt".into()), Some("k".into()), Some("s".into())),
            Some(PinataAuth::Jwt(_))
        ));
        assert!(matches!(
            PinataAuth::from_parts(Some(" ".into()), Some("k".into()), Some("s".into())),
            Some(PinataAuth::ApiKey { .. })
        ));
        assert!(PinataAuth::from_parts(None, Some("k".into()), None).is_none());
    }

    #[tokio::test]
    async fn pin_json_sends_bearer_and_reads_cid() {
        let _m = mock("POST", "/pin-ok/pinning/pinJSONToIPFS")
            .match_header("authorization", "Bearer secret-jwt")
            .match_body(r#"{"a":1}"#)
            .with_status(200)
            .with_body(r#"{"IpfsHash":"QmPinned","PinSize":7}"#)
            .create();

        let c = client("pin-ok", Some(PinataAuth::Jwt("secret-jwt".into())), &[]);
        assert_eq!(c.pin_json(br#"{"a":1}"#).await.unwrap(), "QmPinned");
    }

    #[tokio::test]
    async fn pin_file_uses_key_headers_and_multipart() {
        let _m = mock("POST", "/pin-file/pinning/pinFileToIPFS")
            .match_header("pinata_api_key", "key")
            .match_header("pinata_secret_api_key", "secret")
            .match_header("content-type", Matcher::Regex("multipart/form-data.*".into()))
            .with_status(200)
            .with_body(r#"{"IpfsHash":"QmFile"}"#)
            .create();

        let auth = PinataAuth::ApiKey { key: "key".into(), secret: "secret".into() };
        let c = client("pin-file", Some(auth), &[]);
        let upload = DocumentUpload::new("doc.pdf", "application/pdf", &b"%PDF-1.7"[..]);
        assert_eq!(c.pin_file(&upload).await.unwrap(), "QmFile");
    }

    #[tokio::test]
    async fn pin_without_credentials_fails_before_request() {
        let c = client("no-auth", None, &[]);
        assert!(matches!(c.pin_json(b"{}").await, Err(StorageError::MissingCredentials)));
    }

    #[tokio::test]
    async fn unauthorized_is_reported_distinctly() {
        let _m = mock("POST", "/pin-401/pinning/pinJSONToIPFS")
            .with_status(401)
            .with_body(r#"{"error":"bad key"}"#)
            .create();
        let c = client("pin-401", Some(PinataAuth::Jwt("x".into())), &[]);
        assert!(matches!(c.pin_json(b"{}").await, Err(StorageError::Unauthorized)));
    }

    #[tokio::test]
    async fn response_without_hash_is_missing_cid() {
        let _m = mock("POST", "/pin-nohash/pinning/pinJSONToIPFS")
            .with_status(200)
            .with_body("{}")
            .create();
        let c = client("pin-nohash", Some(PinataAuth::Jwt("x".into())), &[]);
        assert!(matches!(c.pin_json(b"{}").await, Err(StorageError::MissingCid)));
    }

    #[tokio::test]
    async fn fetch_falls_back_to_next_gateway() {
        let _down = mock("GET", "/gw-down/QmCid").with_status(500).create();
        let _up = mock("GET", "/gw-up/QmCid")
            .with_status(200)
            .with_body(r#"{"type":"PAN"}"#)
            .create();

        let c = client("unused", None, &["gw-down", "gw-up"]);
        assert_eq!(c.fetch("QmCid").await.unwrap(), Bytes::from_static(br#"{"type":"PAN"}"#));
    }

    #[tokio::test]
    async fn fetch_reports_last_failure_when_all_gateways_fail() {
        let _a = mock("GET", "/gw-a/QmGone").with_status(502).create();
        let _b = mock("GET", "/gw-b/QmGone").with_status(404).create();

        let c = client("unused", None, &["gw-a", "gw-b"]);
        assert!(matches!(
            c.fetch("QmGone").await,
            Err(StorageError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn fetch_without_gateways_fails() {
        let c = client("unused", None, &[]);
        assert!(matches!(c.fetch("QmCid").await, Err(StorageError::NoGateways)));
    }
}
