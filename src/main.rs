// src/main.rs

//! # NeuralHash SSI - Main Entry Point
//!
//! Wires the ledger, storage, extraction and authentication collaborators
//! from configuration and starts the API server.
//!
//! ## Configuration
//! Settings come from `neuralhash.toml` and `NH_*` environment variables
//! (see `config.rs`). Without `NH_PRIVATE_KEY` the service runs read-only:
//! verification and disclosure work, issuance, revocation and claims answer 503.
//!
//! This host has no platform authenticator, so with `NH_REQUIRE_AUTH_GATE`
//! on (the default) every gated action is denied. Set it to `false` to run
//! ungated.

use anyhow::{Context, Result};
use log::{info, warn};
use neuralhash_ssi::blockchain::EthClient;
use neuralhash_ssi::config::Settings;
use neuralhash_ssi::contracts::{
    CredentialLedger, CredentialRegistry, InteractionHubContract, OnChainTrustRegistry, StaticTrustList,
    TrustRegistry,
};
use neuralhash_ssi::services::api_server::ApiServer;
use neuralhash_ssi::services::{
    CredentialIssuer, DisclosureService, GeminiExtractor, IntegrityChecker, InteractionService, Verifier,
};
use neuralhash_ssi::storage::{ContentStore, IpfsStorage, PinataClient};
use neuralhash_ssi::wallet::configured_gate;
use std::sync::Arc;

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load configuration
/// 2. Connect to the RPC endpoint
/// 3. Build storage, ledger and trust collaborators
/// 4. Start API server
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("failed to load configuration")?;
    info!("configuration loaded: {:?}", settings);

    let client = match settings.private_key.as_deref() {
        Some(key) => EthClient::with_signer(&settings.rpc_url, key)
            .await
            .context("failed to initialize signing client - check RPC URL and private key")?,
        None => {
            warn!("NH_PRIVATE_KEY not set; running read-only");
            EthClient::read_only(&settings.rpc_url).context("invalid RPC URL")?
        }
    };
    let client = Arc::new(client);

    let store: Arc<dyn ContentStore> = match settings.ipfs_api_url.as_deref() {
        Some(url) => Arc::new(IpfsStorage::new(url).context("invalid IPFS API URL")?),
        None => Arc::new(
            PinataClient::new(
                settings.pinata_api_url.clone(),
                settings.pinata_auth(),
                settings.gateways.clone(),
                settings.request_timeout(),
            )
            .context("failed to build Pinata client")?,
        ),
    };

    let ledger: Arc<dyn CredentialLedger> =
        Arc::new(CredentialRegistry::new(client.clone(), settings.credential_registry()?));

    let trust: Arc<dyn TrustRegistry> = match settings.trust_registry()? {
        Some(address) => Arc::new(OnChainTrustRegistry::new(client.clone(), address)),
        None => Arc::new(StaticTrustList::new(settings.trusted_issuer_addresses()?)),
    };

    let verifier = Verifier::new(ledger.clone(), trust, IntegrityChecker::new(store.clone()));

    let gate = configured_gate(settings.require_auth_gate, None);

    let issuer = match client.address() {
        Some(address) => {
            let extractor = GeminiExtractor::new(
                settings.gemini_api_url.clone(),
                settings.gemini_model.clone(),
                settings.gemini_api_key.clone(),
                settings.request_timeout(),
            )
            .context("failed to build extraction client")?;
            Some(Arc::new(
                CredentialIssuer::new(address, store.clone(), ledger.clone(), gate.clone())
                    .with_extractor(Arc::new(extractor)),
            ))
        }
        None => None,
    };

    let interaction = match (client.address(), settings.interaction_hub()?) {
        (Some(account), Some(hub)) => Some(Arc::new(InteractionService::new(
            account,
            Arc::new(InteractionHubContract::new(client.clone(), hub)),
            ledger.clone(),
            DisclosureService::new(store.clone()),
            gate.clone(),
        ))),
        _ => None,
    };

    let addr = settings.listen_socket()?;
    println!("NeuralHash SSI API running at http://{}", addr);
    println!("Available endpoints:");
    println!("- POST /credentials/fingerprint");
    println!("- POST /credentials/verify");
    println!("- GET  /credentials/:owner/verify");
    println!("- POST /credentials/disclose");
    println!("- POST /credentials/extract");
    println!("- POST /credentials/issue");
    println!("- POST /credentials/revoke");
    println!("- GET  /claims, POST /claims");
    println!("- POST /claims/:id/fulfill");
    println!("- GET  /attestations, POST /attestations");
    println!("- GET  /health");

    let mut server = ApiServer::new(Arc::new(verifier), issuer);
    if let Some(interaction) = interaction {
        server = server.with_interaction(interaction);
    }
    Arc::new(server)
        .run(addr)
        .await
        .context("API server stopped")
}
