// src/wallet/key_management.rs
//! Device key management for the authentication gate.
//!
//! A `KeyManager` plays the role of a platform authenticator: it owns a
//! secp256k1 key, hands out the public half at registration, and signs
//! challenges with Keccak-256 prehashing.

use crate::utils::crypto::hash_data;
use crate::wallet::auth_gate::{AuthFailure, Authenticator};
use ethers::utils::hex;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// Secure key management for elliptic curve cryptography.
///
/// # Security Notes
/// - Secret keys are never exposed publicly
/// - Uses deterministic ECDSA (RFC 6979)
#[derive(Clone)]
pub struct KeyManager {
    /// Securely stored private key (never exposed)
    signing_key: SigningKey,
}

impl KeyManager {
    /// Generates a KeyManager with a fresh random key.
    pub fn generate() -> Self {
        KeyManager {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Loads a key from hex (with or without `0x`).
    pub fn from_hex(secret: &str) -> Result<Self, AuthFailure> {
        let trimmed = secret.trim();
        let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| AuthFailure::Failed(e.to_string()))?;
        let signing_key = SigningKey::from_slice(&bytes).map_err(|e| AuthFailure::Failed(e.to_string()))?;
        Ok(KeyManager { signing_key })
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        *self.signing_key.verifying_key()
    }

    /// Signs a message using ECDSA (secp256k1) with Keccak-256 prehashing.
    ///
    /// # Returns
    /// 64-byte compact ECDSA signature (R || S values)
    pub fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, AuthFailure> {
        let hash = hash_data(message);
        let signature: Signature = self
            .signing_key
            .sign_prehash(&hash)
            .map_err(|e| AuthFailure::Failed(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

impl Authenticator for KeyManager {
    fn register(&self, _user_hint: &str) -> Result<VerifyingKey, AuthFailure> {
        Ok(self.verifying_key())
    }

    fn sign_challenge(&self, challenge: &[u8; 32]) -> Result<Vec<u8>, AuthFailure> {
        self.sign_message(challenge)
    }
}
