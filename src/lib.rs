// src/lib.rs
//! NeuralHash SSI credential core.
//!
//! Credentials are JSON payloads pinned to content-addressed storage and
//! anchored on a registry contract by their Keccak-256 fingerprint. This crate
//! builds and fingerprints payloads, checks them against the ledger, produces
//! selective-disclosure views and serves the whole thing over HTTP.

pub mod blockchain; // Ethereum RPC client
pub mod config; // Layered settings
pub mod contracts; // Registry, trust and interaction contracts
pub mod error;
pub mod models; // Data structures
pub mod services; // Issuance, verification, disclosure, API
pub mod storage; // IPFS / Pinata
pub mod utils; // Canonical JSON and hashing
pub mod wallet; // Authentication gate
