// src/services/api_server.rs
//! HTTP API for the credential lifecycle.
//!
//! Routes:
//! - `POST /credentials/fingerprint`: fingerprint of a payload
//! - `POST /credentials/verify`: integrity check of one ledger record
//! - `GET  /credentials/:owner/verify`: every record held by `owner`
//! - `POST /credentials/disclose`: allow-listed view of a payload
//! - `POST /credentials/extract`: suggested fields for an uploaded document
//! - `POST /credentials/issue`: pin and anchor a credential (gated)
//! - `POST /credentials/revoke`: revoke through the issuer (gated)
//! - `GET  /claims`, `POST /claims`: claim requests to and from this account
//! - `POST /claims/:id/fulfill`: answer a claim request (gated)
//! - `GET  /attestations`, `POST /attestations`
//! - `GET  /health`
//!
//! Failures are returned as `{ "error": "..." }`.

use crate::blockchain::eth_client::parse_address;
use crate::error::{DisclosureError, ExtractionError, InteractionError, IssueError, LedgerError};
use crate::models::credential::{CredentialRecord, PayloadDocument, PayloadShape};
use crate::models::document::DocumentType;
use crate::models::draft::{DocumentUpload, IssuanceDraft};
use crate::models::interaction::{Attestation, ClaimRequest};
use crate::services::credential_issuer::{CredentialIssuer, IssuedCredential};
use crate::services::disclosure::{disclose, DisclosureAllowList};
use crate::services::interaction::{FulfilledClaim, InteractionService};
use crate::services::verifier::{VerificationReport, Verifier};
use crate::utils::crypto::{fingerprint, Fingerprint};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use ethers::types::{Address, H256};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Error body with its status code.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    /// Ledger or storage failure
    Upstream(String),
    /// The service runs without the collaborator this route needs
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m),
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidAddress(_) | LedgerError::InvalidInput(_) => ApiError::BadRequest(e.to_string()),
            LedgerError::MissingSigner => ApiError::Unavailable(e.to_string()),
            _ => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<IssueError> for ApiError {
    fn from(e: IssueError) -> Self {
        match e {
            IssueError::AuthDenied(reason) => ApiError::Forbidden(reason),
            IssueError::Ledger(inner) => inner.into(),
            IssueError::Extraction(ExtractionError::MissingApiKey) => {
                ApiError::Unavailable(e.to_string())
            }
            IssueError::Storage(_) | IssueError::Extraction(_) => ApiError::Upstream(e.to_string()),
            IssueError::Serialization(_) => ApiError::Internal(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<InteractionError> for ApiError {
    fn from(e: InteractionError) -> Self {
        match e {
            InteractionError::AuthDenied(reason) => ApiError::Forbidden(reason),
            InteractionError::RequestNotFound(_) | InteractionError::CredentialNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            InteractionError::Ledger(inner) => inner.into(),
            InteractionError::Disclosure(DisclosureError::Fetch(_)) => ApiError::Upstream(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct FingerprintResponse {
    pub fingerprint: Fingerprint,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DiscloseRequest {
    pub payload: Value,
    /// Defaults to the public allow-list
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

fn default_mime_type() -> String {
    "application/pdf".to_string()
}

/// A source document sent inline.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBody {
    pub document_type: DocumentType,
    pub file_name: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// Base64 file content
    pub content: String,
}

impl DocumentBody {
    fn into_draft(self) -> Result<IssuanceDraft, ApiError> {
        let bytes = base64::decode(self.content.trim())
            .map_err(|e| ApiError::BadRequest(format!("content is not valid base64: {}", e)))?;
        let mut draft = IssuanceDraft::new(self.document_type);
        draft.attach(DocumentUpload::new(self.file_name, self.mime_type, bytes));
        Ok(draft)
    }
}

/// Draft state after extraction, for the caller to confirm.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub document_type: DocumentType,
    pub fields: BTreeMap<String, String>,
    pub selected: Vec<String>,
}

impl From<&IssuanceDraft> for DraftView {
    fn from(draft: &IssuanceDraft) -> Self {
        DraftView {
            document_type: draft.document_type(),
            fields: draft.extracted_fields().clone(),
            selected: draft.selected_keys().to_vec(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    #[serde(flatten)]
    pub document: DocumentBody,
    /// Confirmed field values; extraction runs when absent
    #[serde(default)]
    pub fields: Option<BTreeMap<String, String>>,
    /// Fields to include; defaults to every field with a value
    #[serde(default)]
    pub selected: Option<Vec<String>>,
    /// Blank or invalid issues to the issuer itself
    #[serde(default)]
    pub recipient: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RevokeRequest {
    pub owner: String,
    pub fingerprint: Fingerprint,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClaimRequestBody {
    pub target: String,
    #[serde(default)]
    pub fields: Vec<String>,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FulfillRequest {
    pub fingerprint: Fingerprint,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AttestRequest {
    pub target: String,
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TxResponse {
    pub tx_hash: H256,
}

/// API server state containing all service dependencies
pub struct ApiServer {
    verifier: Arc<Verifier>,
    /// Absent when the service runs without a signing key
    issuer: Option<Arc<CredentialIssuer>>,
    /// Absent without a signing key or interaction hub address
    interaction: Option<Arc<InteractionService>>,
}

impl ApiServer {
    pub fn new(verifier: Arc<Verifier>, issuer: Option<Arc<CredentialIssuer>>) -> Self {
        ApiServer {
            verifier,
            issuer,
            interaction: None,
        }
    }

    pub fn with_interaction(mut self, interaction: Arc<InteractionService>) -> Self {
        self.interaction = Some(interaction);
        self
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/health", get(Self::health_handler))
            .route("/credentials/fingerprint", post(Self::fingerprint_handler))
            .route("/credentials/verify", post(Self::verify_handler))
            .route("/credentials/:owner/verify", get(Self::verify_owner_handler))
            .route("/credentials/disclose", post(Self::disclose_handler))
            .route("/credentials/extract", post(Self::extract_handler))
            .route("/credentials/issue", post(Self::issue_handler))
            .route("/credentials/revoke", post(Self::revoke_handler))
            .route("/claims", get(Self::claims_handler).post(Self::request_claim_handler))
            .route("/claims/:id/fulfill", post(Self::fulfill_handler))
            .route(
                "/attestations",
                get(Self::attestations_handler).post(Self::attest_handler),
            )
            .layer(CorsLayer::permissive())
            .with_state(self)
    }

    /// Binds `addr` and serves until the listener fails.
    pub async fn run(self: Arc<Self>, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("API server listening on http://{}", addr);
        axum::serve(listener, self.router()).await
    }

    fn issuer(&self) -> Result<&CredentialIssuer, ApiError> {
        self.issuer
            .as_deref()
            .ok_or_else(|| ApiError::Unavailable("issuing and revoking need NH_PRIVATE_KEY".into()))
    }

    fn interaction(&self) -> Result<&InteractionService, ApiError> {
        self.interaction.as_deref().ok_or_else(|| {
            ApiError::Unavailable("claims need NH_PRIVATE_KEY and NH_INTERACTION_HUB_ADDRESS".into())
        })
    }

    async fn health_handler() -> Json<Value> {
        Json(json!({ "status": "ok" }))
    }

    async fn fingerprint_handler(Json(payload): Json<Value>) -> Result<Json<FingerprintResponse>, ApiError> {
        let shape = PayloadShape::classify(&payload);
        if shape.is_malformed() {
            return Err(ApiError::BadRequest("payload must be a JSON object".into()));
        }
        Ok(Json(FingerprintResponse {
            fingerprint: fingerprint(&PayloadDocument::from(shape)),
        }))
    }

    async fn verify_handler(
        State(state): State<Arc<ApiServer>>,
        Json(record): Json<CredentialRecord>,
    ) -> Json<VerificationReport> {
        Json(state.verifier.verify_record(record).await)
    }

    async fn verify_owner_handler(
        State(state): State<Arc<ApiServer>>,
        Path(owner): Path<String>,
    ) -> Result<Json<Vec<VerificationReport>>, ApiError> {
        let owner: Address = parse_address(&owner)?;
        match state.verifier.verify_owner(owner).await {
            Ok(reports) => Ok(Json(reports)),
            Err(e) => {
                warn!("reading credentials of {:?} failed: {}", owner, e);
                Err(e.into())
            }
        }
    }

    async fn disclose_handler(Json(request): Json<DiscloseRequest>) -> Json<BTreeMap<String, Value>> {
        let allow = match request.fields {
            Some(fields) => DisclosureAllowList::new(fields),
            None => DisclosureAllowList::public(),
        };
        Json(disclose(&request.payload, &allow))
    }

    async fn extract_handler(
        State(state): State<Arc<ApiServer>>,
        Json(request): Json<DocumentBody>,
    ) -> Result<Json<DraftView>, ApiError> {
        let issuer = state.issuer()?;
        let mut draft = request.into_draft()?;
        issuer.extract_into(&mut draft).await?;
        Ok(Json(DraftView::from(&draft)))
    }

    async fn issue_handler(
        State(state): State<Arc<ApiServer>>,
        Json(request): Json<IssueRequest>,
    ) -> Result<Json<IssuedCredential>, ApiError> {
        let issuer = state.issuer()?;
        let mut draft = request.document.into_draft()?;
        match request.fields {
            Some(fields) => {
                for (key, value) in fields {
                    draft.set_field(&key, value)?;
                }
            }
            None => issuer.extract_into(&mut draft).await?,
        }
        match request.selected {
            Some(keys) => draft.select_only(&keys)?,
            None => draft.select_filled(),
        }
        draft.set_recipient(request.recipient);

        match issuer.issue(&draft).await {
            Ok(issued) => Ok(Json(issued)),
            Err(e) => {
                error!("issuing {} credential failed: {}", draft.document_type(), e);
                Err(e.into())
            }
        }
    }

    async fn revoke_handler(
        State(state): State<Arc<ApiServer>>,
        Json(request): Json<RevokeRequest>,
    ) -> Result<Json<TxResponse>, ApiError> {
        let issuer = state.issuer()?;
        let owner = parse_address(&request.owner)?;
        match issuer.revoke(owner, request.fingerprint).await {
            Ok(tx_hash) => Ok(Json(TxResponse { tx_hash })),
            Err(e) => {
                error!("revocation of {} failed: {}", request.fingerprint, e);
                Err(e.into())
            }
        }
    }

    async fn claims_handler(State(state): State<Arc<ApiServer>>) -> Result<Json<Vec<ClaimRequest>>, ApiError> {
        Ok(Json(state.interaction()?.incoming_requests().await?))
    }

    async fn request_claim_handler(
        State(state): State<Arc<ApiServer>>,
        Json(request): Json<ClaimRequestBody>,
    ) -> Result<Json<TxResponse>, ApiError> {
        let interaction = state.interaction()?;
        let target = parse_address(&request.target)?;
        let tx_hash = interaction
            .request_claim(target, request.fields, &request.reason)
            .await?;
        Ok(Json(TxResponse { tx_hash }))
    }

    async fn fulfill_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<u64>,
        Json(request): Json<FulfillRequest>,
    ) -> Result<Json<FulfilledClaim>, ApiError> {
        let interaction = state.interaction()?;
        match interaction.fulfill(id, request.fingerprint).await {
            Ok(claim) => Ok(Json(claim)),
            Err(e) => {
                warn!("fulfilling claim request {} failed: {}", id, e);
                Err(e.into())
            }
        }
    }

    async fn attestations_handler(
        State(state): State<Arc<ApiServer>>,
    ) -> Result<Json<Vec<Attestation>>, ApiError> {
        Ok(Json(state.interaction()?.attestations().await?))
    }

    async fn attest_handler(
        State(state): State<Arc<ApiServer>>,
        Json(request): Json<AttestRequest>,
    ) -> Result<Json<TxResponse>, ApiError> {
        let interaction = state.interaction()?;
        let target = parse_address(&request.target)?;
        let tx_hash = interaction.attest(target, &request.text).await?;
        Ok(Json(TxResponse { tx_hash }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{CredentialLedger, InteractionHub, MemoryLedger, StaticTrustList};
    use crate::models::credential::VerificationOutcome;
    use crate::models::draft::ExtractedDocument;
    use crate::services::disclosure::DisclosureService;
    use crate::services::extraction::DocumentExtractor;
    use crate::services::verifier::IntegrityChecker;
    use crate::storage::{ContentStore, MemoryStore};
    use crate::utils::crypto::fingerprint_bytes;
    use crate::utils::serialization::canonical_bytes;
    use crate::wallet::auth_gate::OpenGate;
    use async_trait::async_trait;

    struct FixedExtractor;

    #[async_trait]
    impl DocumentExtractor for FixedExtractor {
        async fn extract(
            &self,
            _upload: &DocumentUpload,
            _expected: DocumentType,
        ) -> Result<ExtractedDocument, ExtractionError> {
            Ok(ExtractedDocument {
                document_type: "PAN".into(),
                name: "Alice".into(),
                year: "1990".into(),
                fields: BTreeMap::from([
                    ("full_name".to_string(), "Alice".to_string()),
                    ("pan_number".to_string(), "ABCDE1234F".to_string()),
                ]),
            })
        }
    }

    fn issuer_address() -> Address {
        Address::repeat_byte(0x1a)
    }

    fn requester() -> Address {
        Address::repeat_byte(0x77)
    }

    fn server(store: Arc<MemoryStore>, ledger: Arc<MemoryLedger>) -> Arc<ApiServer> {
        let verifier = Verifier::new(
            ledger.clone(),
            Arc::new(StaticTrustList::new([issuer_address()])),
            IntegrityChecker::new(store.clone()),
        );
        let issuer = CredentialIssuer::new(issuer_address(), store.clone(), ledger.clone(), Arc::new(OpenGate));
        let interaction = InteractionService::new(
            issuer_address(),
            ledger.clone(),
            ledger,
            DisclosureService::new(store),
            Arc::new(OpenGate),
        );
        Arc::new(ApiServer::new(Arc::new(verifier), Some(Arc::new(issuer))).with_interaction(Arc::new(interaction)))
    }

    fn empty_server() -> Arc<ApiServer> {
        server(Arc::new(MemoryStore::new()), Arc::new(MemoryLedger::new(issuer_address())))
    }

    fn read_only_server() -> Arc<ApiServer> {
        let ledger = Arc::new(MemoryLedger::new(issuer_address()));
        let verifier = Verifier::new(
            ledger,
            Arc::new(StaticTrustList::new(Vec::<Address>::new())),
            IntegrityChecker::new(Arc::new(MemoryStore::new())),
        );
        Arc::new(ApiServer::new(Arc::new(verifier), None))
    }

    fn pan_document() -> DocumentBody {
        DocumentBody {
            document_type: DocumentType::Pan,
            file_name: "pan.pdf".into(),
            mime_type: default_mime_type(),
            content: base64::encode(b"%PDF-1.7"),
        }
    }

    fn issue_request(fields: Option<BTreeMap<String, String>>, recipient: Address) -> IssueRequest {
        IssueRequest {
            document: pan_document(),
            fields,
            selected: None,
            recipient: format!("{:?}", recipient),
        }
    }

    #[tokio::test]
    async fn fingerprint_ignores_wrapper_and_key_order() {
        let flat = ApiServer::fingerprint_handler(Json(json!({"year": "2024", "type": "PAN"})))
            .await
            .unwrap();
        let wrapped = ApiServer::fingerprint_handler(Json(json!({"credential": {"type": "PAN", "year": "2024"}})))
            .await
            .unwrap();
        assert_eq!(flat.0, wrapped.0);

        let rejected = ApiServer::fingerprint_handler(Json(json!([1, 2]))).await;
        assert!(matches!(rejected, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn disclose_defaults_to_public_fields() {
        let body = DiscloseRequest {
            payload: json!({"type": "Passport", "year": "2021", "name": "Jane Doe"}),
            fields: None,
        };
        let view = ApiServer::disclose_handler(Json(body)).await.0;
        assert_eq!(view.len(), 2);
        assert!(!view.contains_key("name"));
    }

    #[tokio::test]
    async fn owner_verification_and_revocation() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(MemoryLedger::new(issuer_address()));
        let holder = Address::repeat_byte(0xb0);

        let body = canonical_bytes(&json!({"type": "PAN", "year": "2024"}));
        let cid = store.pin_json(&body).await.unwrap();
        let fp = fingerprint_bytes(&body);
        ledger.issue_credential(holder, fp, &cid).await.unwrap();

        let state = server(store, ledger);
        let reports = ApiServer::verify_owner_handler(State(state.clone()), Path(format!("{:?}", holder)))
            .await
            .unwrap()
            .0;
        assert_eq!(reports[0].outcome, VerificationOutcome::Authentic);
        assert_eq!(reports[0].issuer_trusted, Some(true));

        let revoke = RevokeRequest {
            owner: format!("{:?}", holder),
            fingerprint: fp,
        };
        ApiServer::revoke_handler(State(state.clone()), Json(revoke)).await.unwrap();

        let reports = ApiServer::verify_owner_handler(State(state), Path(format!("{:?}", holder)))
            .await
            .unwrap()
            .0;
        assert_eq!(reports[0].outcome, VerificationOutcome::Revoked);
    }

    #[tokio::test]
    async fn bad_owner_is_a_client_error() {
        let result = ApiServer::verify_owner_handler(State(empty_server()), Path("0xnope".into())).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn issue_with_confirmed_fields_verifies() {
        let holder = Address::repeat_byte(0xb0);
        let state = empty_server();
        let fields = BTreeMap::from([
            ("full_name".to_string(), "Alice".to_string()),
            ("pan_number".to_string(), "ABCDE1234F".to_string()),
            ("father_name".to_string(), " ".to_string()),
        ]);

        let issued = ApiServer::issue_handler(State(state.clone()), Json(issue_request(Some(fields), holder)))
            .await
            .unwrap()
            .0;
        assert_eq!(issued.recipient, holder);
        assert_eq!(issued.payload.fields.len(), 2);
        assert_eq!(issued.payload.name, "Alice");

        let reports = ApiServer::verify_owner_handler(State(state), Path(format!("{:?}", holder)))
            .await
            .unwrap()
            .0;
        assert_eq!(reports[0].outcome, VerificationOutcome::Authentic);
    }

    #[tokio::test]
    async fn issue_honours_explicit_selection() {
        let fields = BTreeMap::from([
            ("full_name".to_string(), "Alice".to_string()),
            ("pan_number".to_string(), "ABCDE1234F".to_string()),
        ]);
        let mut request = issue_request(Some(fields.clone()), issuer_address());
        request.selected = Some(vec!["pan_number".into()]);
        let issued = ApiServer::issue_handler(State(empty_server()), Json(request))
            .await
            .unwrap()
            .0;
        assert_eq!(issued.payload.fields.keys().collect::<Vec<_>>(), ["pan_number"]);
        assert_eq!(issued.payload.name, "");

        let mut request = issue_request(Some(fields), issuer_address());
        request.selected = Some(vec!["roll_number".into()]);
        let rejected = ApiServer::issue_handler(State(empty_server()), Json(request)).await;
        assert!(matches!(rejected, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn extraction_routes_need_an_extractor() {
        let result = ApiServer::extract_handler(State(empty_server()), Json(pan_document())).await;
        assert!(matches!(result, Err(ApiError::Unavailable(_))));

        let result =
            ApiServer::issue_handler(State(empty_server()), Json(issue_request(None, issuer_address()))).await;
        assert!(matches!(result, Err(ApiError::Unavailable(_))));
    }

    #[tokio::test]
    async fn extract_and_issue_with_extractor() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(MemoryLedger::new(issuer_address()));
        let verifier = Verifier::new(
            ledger.clone(),
            Arc::new(StaticTrustList::new(Vec::<Address>::new())),
            IntegrityChecker::new(store.clone()),
        );
        let issuer = CredentialIssuer::new(issuer_address(), store, ledger, Arc::new(OpenGate))
            .with_extractor(Arc::new(FixedExtractor));
        let state = Arc::new(ApiServer::new(Arc::new(verifier), Some(Arc::new(issuer))));

        let view = ApiServer::extract_handler(State(state.clone()), Json(pan_document()))
            .await
            .unwrap()
            .0;
        assert_eq!(view.document_type, DocumentType::Pan);
        assert_eq!(view.fields["pan_number"], "ABCDE1234F");
        assert_eq!(view.fields["father_name"], "");
        assert_eq!(view.selected, ["full_name", "pan_number"]);

        let issued = ApiServer::issue_handler(State(state), Json(issue_request(None, issuer_address())))
            .await
            .unwrap()
            .0;
        assert_eq!(issued.payload.fields.len(), 2);
    }

    #[tokio::test]
    async fn invalid_upload_is_a_client_error() {
        let mut body = pan_document();
        body.content = "not base64!".into();
        let result = ApiServer::extract_handler(State(empty_server()), Json(body)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn read_only_service_rejects_writes() {
        let state = read_only_server();
        let fields = BTreeMap::from([("full_name".to_string(), "Alice".to_string())]);
        let issue = ApiServer::issue_handler(State(state.clone()), Json(issue_request(Some(fields), issuer_address())));
        assert!(matches!(issue.await, Err(ApiError::Unavailable(_))));

        let revoke = RevokeRequest {
            owner: format!("{:?}", issuer_address()),
            fingerprint: fingerprint_bytes(b"x"),
        };
        let revoke = ApiServer::revoke_handler(State(state.clone()), Json(revoke)).await;
        assert!(matches!(revoke, Err(ApiError::Unavailable(_))));

        assert!(matches!(
            ApiServer::claims_handler(State(state)).await,
            Err(ApiError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn claim_request_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(MemoryLedger::new(issuer_address()));
        let body = canonical_bytes(&json!({"type": "PAN", "year": "2024", "name": "Alice"}));
        let cid = store.pin_json(&body).await.unwrap();
        let fp = fingerprint_bytes(&body);
        ledger.issue_credential(issuer_address(), fp, &cid).await.unwrap();
        ledger.insert_request(ClaimRequest {
            id: 4,
            requester: requester(),
            subject: issuer_address(),
            fields: vec!["type".into()],
            purpose: "kyc".into(),
            fulfilled: false,
            created_at: 0,
        });
        let state = server(store, ledger.clone());

        let incoming = ApiServer::claims_handler(State(state.clone())).await.unwrap().0;
        assert_eq!(incoming.len(), 1);

        let claim = ApiServer::fulfill_handler(State(state.clone()), Path(4), Json(FulfillRequest { fingerprint: fp }))
            .await
            .unwrap()
            .0;
        assert_eq!(claim.disclosed, BTreeMap::from([("type".to_string(), json!("PAN"))]));
        assert_eq!(claim.shared_cid, cid);

        let missing =
            ApiServer::fulfill_handler(State(state.clone()), Path(9), Json(FulfillRequest { fingerprint: fp })).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));

        let attest = AttestRequest {
            target: format!("{:?}", requester()),
            text: "verified in person".into(),
        };
        ApiServer::attest_handler(State(state.clone()), Json(attest)).await.unwrap();
        assert_eq!(ledger.attestations_for(requester()).await.unwrap().len(), 2);

        let blank = ClaimRequestBody {
            target: format!("{:?}", requester()),
            fields: vec![],
            reason: " ".into(),
        };
        assert!(matches!(
            ApiServer::request_claim_handler(State(state), Json(blank)).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn errors_map_to_status_codes() {
        let denied: ApiError = IssueError::AuthDenied("cancelled".into()).into();
        assert_eq!(denied.into_response().status(), StatusCode::FORBIDDEN);

        let upstream: ApiError = LedgerError::Provider("rpc down".into()).into();
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);

        let invalid: ApiError = IssueError::NoFieldsSelected.into();
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let no_signer: ApiError = LedgerError::MissingSigner.into();
        assert_eq!(no_signer.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let revoked: ApiError = InteractionError::Disclosure(DisclosureError::Revoked).into();
        assert_eq!(revoked.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
