// src/config.rs
//! Service configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults (Sepolia deployment, public gateways)
//! 2. optional `neuralhash.toml` in the working directory
//! 3. environment variables prefixed `NH_` (a `.env` file is loaded first)
//!
//! List values (`NH_TRUSTED_ISSUERS`, `NH_GATEWAYS`) are comma separated.

use crate::blockchain::eth_client::parse_address;
use crate::error::ConfigError;
use crate::services::extraction;
use crate::storage::pinata::{self, PinataAuth};
use config::{Config, Environment, File};
use ethers::types::Address;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://rpc.sepolia.org";
pub const DEFAULT_CREDENTIAL_REGISTRY: &str = "0xEf5bCeB0F946f360aBf0dd42ff3736f64Ece73e3";
pub const DEFAULT_INTERACTION_HUB: &str = "0x329C75F53B2b85F83B85b123Fd98b93dDE6FE23a";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const CONFIG_FILE: &str = "neuralhash";
const ENV_PREFIX: &str = "NH";

#[derive(Clone, Deserialize)]
pub struct Settings {
    pub rpc_url: String,
    /// Signing key for write calls; read-only mode without it
    pub private_key: Option<String>,
    pub credential_registry_address: String,
    pub trust_registry_address: Option<String>,
    pub interaction_hub_address: Option<String>,
    /// Used when no trust registry contract is configured
    #[serde(default, deserialize_with = "string_or_list")]
    pub trusted_issuers: Vec<String>,
    pub pinata_jwt: Option<String>,
    pub pinata_api_key: Option<String>,
    pub pinata_secret_api_key: Option<String>,
    pub pinata_api_url: String,
    #[serde(deserialize_with = "string_or_list")]
    pub gateways: Vec<String>,
    /// Local IPFS node API; takes precedence over Pinata when set
    pub ipfs_api_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_url: String,
    pub listen_addr: String,
    pub request_timeout_secs: u64,
    /// Gated actions are denied when no authenticator is attached
    pub require_auth_gate: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Settings")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &redact(&self.private_key))
            .field("credential_registry_address", &self.credential_registry_address)
            .field("trust_registry_address", &self.trust_registry_address)
            .field("interaction_hub_address", &self.interaction_hub_address)
            .field("trusted_issuers", &self.trusted_issuers)
            .field("pinata_jwt", &redact(&self.pinata_jwt))
            .field("pinata_api_key", &redact(&self.pinata_api_key))
            .field("pinata_secret_api_key", &redact(&self.pinata_secret_api_key))
            .field("pinata_api_url", &self.pinata_api_url)
            .field("gateways", &self.gateways)
            .field("ipfs_api_url", &self.ipfs_api_url)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_url", &self.gemini_api_url)
            .field("listen_addr", &self.listen_addr)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("require_auth_gate", &self.require_auth_gate)
            .finish()
    }
}

impl Settings {
    /// Loads `.env`, the optional config file and `NH_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_sources(Some(CONFIG_FILE), None)
    }

    /// Builds settings from an optional file and an explicit environment
    /// map (`None` reads the process environment).
    pub fn from_sources(
        file: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("rpc_url", DEFAULT_RPC_URL)?
            .set_default("credential_registry_address", DEFAULT_CREDENTIAL_REGISTRY)?
            .set_default("interaction_hub_address", DEFAULT_INTERACTION_HUB)?
            .set_default("trusted_issuers", Vec::<String>::new())?
            .set_default("pinata_api_url", pinata::DEFAULT_API_URL)?
            .set_default(
                "gateways",
                pinata::DEFAULT_GATEWAYS.iter().map(|g| g.to_string()).collect::<Vec<_>>(),
            )?
            .set_default("gemini_model", extraction::DEFAULT_MODEL)?
            .set_default("gemini_api_url", extraction::DEFAULT_API_URL)?
            .set_default("listen_addr", DEFAULT_LISTEN_ADDR)?
            .set_default("request_timeout_secs", 30)?
            .set_default("require_auth_gate", true)?;

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        let environment = Environment::with_prefix(ENV_PREFIX).source(env);

        let settings: Settings = builder.add_source(environment).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credential_registry()?;
        self.trust_registry()?;
        self.interaction_hub()?;
        self.trusted_issuer_addresses()?;
        self.listen_socket()?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be greater than zero".into()));
        }
        if self.gateways.iter().all(|g| g.trim().is_empty()) {
            return Err(ConfigError::Invalid("at least one IPFS gateway is required".into()));
        }
        Ok(())
    }

    pub fn credential_registry(&self) -> Result<Address, ConfigError> {
        parse_address(&self.credential_registry_address)
            .map_err(|e| ConfigError::Invalid(format!("credential_registry_address: {}", e)))
    }

    pub fn trust_registry(&self) -> Result<Option<Address>, ConfigError> {
        optional_address("trust_registry_address", self.trust_registry_address.as_deref())
    }

    pub fn interaction_hub(&self) -> Result<Option<Address>, ConfigError> {
        optional_address("interaction_hub_address", self.interaction_hub_address.as_deref())
    }

    pub fn trusted_issuer_addresses(&self) -> Result<Vec<Address>, ConfigError> {
        self.trusted_issuers
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                parse_address(raw).map_err(|e| ConfigError::Invalid(format!("trusted_issuers: {}", e)))
            })
            .collect()
    }

    pub fn listen_socket(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("listen_addr: {}", self.listen_addr)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pinata_auth(&self) -> Option<PinataAuth> {
        PinataAuth::from_parts(
            self.pinata_jwt.clone(),
            self.pinata_api_key.clone(),
            self.pinata_secret_api_key.clone(),
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    List(Vec<String>),
    Joined(String),
}

/// Accepts a TOML array or a comma separated environment value.
fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::List(items) => items,
        StringOrList::Joined(joined) => joined.split(',').map(String::from).collect(),
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

fn optional_address(key: &str, raw: Option<&str>) -> Result<Option<Address>, ConfigError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_address(raw)
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}
