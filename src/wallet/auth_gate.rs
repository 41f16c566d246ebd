// src/wallet/auth_gate.rs
//! Authentication gate consulted before sensitive actions.
//!
//! Issuance, revocation and claim fulfilment ask the gate first. The
//! challenge gate follows the platform-authenticator pattern: register a
//! device key on first use, then require a fresh signed challenge each time.

use crate::utils::crypto::hash_data;
use async_trait::async_trait;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use log::{debug, warn};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Result of an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GateDecision {
    Granted,
    Denied { reason: String },
}

impl GateDecision {
    fn denied(reason: impl Into<String>) -> Self {
        GateDecision::Denied { reason: reason.into() }
    }

    /// `Ok(())` when granted, the denial reason otherwise.
    pub fn into_result(self) -> Result<(), String> {
        match self {
            GateDecision::Granted => Ok(()),
            GateDecision::Denied { reason } => Err(reason),
        }
    }
}

/// Authenticator-side failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("authenticator not available")]
    Unsupported,
    #[error("cancelled")]
    Cancelled,
    #[error("stale registration")]
    InvalidState,
    #[error("{0}")]
    Failed(String),
}

/// A device able to prove presence of the user.
pub trait Authenticator: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Creates (or returns) the device key for `user_hint`.
    fn register(&self, user_hint: &str) -> Result<VerifyingKey, AuthFailure>;

    fn sign_challenge(&self, challenge: &[u8; 32]) -> Result<Vec<u8>, AuthFailure>;
}

#[async_trait]
pub trait AuthenticationGate: Send + Sync {
    async fn authenticate(&self, user_hint: &str) -> GateDecision;
}

/// Grants everything. Used when gating is disabled in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

#[async_trait]
impl AuthenticationGate for OpenGate {
    async fn authenticate(&self, _user_hint: &str) -> GateDecision {
        GateDecision::Granted
    }
}

/// Stand-in for hosts without a platform authenticator. Never available,
/// so a [`ChallengeGate`] over it denies every attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthenticator;

impl Authenticator for NoAuthenticator {
    fn is_available(&self) -> bool {
        false
    }

    fn register(&self, _user_hint: &str) -> Result<VerifyingKey, AuthFailure> {
        Err(AuthFailure::Unsupported)
    }

    fn sign_challenge(&self, _challenge: &[u8; 32]) -> Result<Vec<u8>, AuthFailure> {
        Err(AuthFailure::Unsupported)
    }
}

/// Builds the gate for a process.
///
/// With gating required the gate runs the challenge flow against
/// `authenticator`; when none is attached it fails closed. With gating off
/// every request is granted.
pub fn configured_gate(
    required: bool,
    authenticator: Option<Box<dyn Authenticator>>,
) -> Arc<dyn AuthenticationGate> {
    match (required, authenticator) {
        (false, _) => {
            warn!("authentication gate disabled; issuance, revocation and claim fulfilment are not gated");
            Arc::new(OpenGate)
        }
        (true, Some(authenticator)) => Arc::new(ChallengeGate::new(authenticator)),
        (true, None) => {
            warn!("authentication gate required but no authenticator is attached; gated actions will be denied");
            Arc::new(ChallengeGate::new(NoAuthenticator))
        }
    }
}

impl<A: Authenticator + ?Sized> Authenticator for Box<A> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn register(&self, user_hint: &str) -> Result<VerifyingKey, AuthFailure> {
        (**self).register(user_hint)
    }

    fn sign_challenge(&self, challenge: &[u8; 32]) -> Result<Vec<u8>, AuthFailure> {
        (**self).sign_challenge(challenge)
    }
}

/// Challenge/response gate over a registered device key.
pub struct ChallengeGate<A> {
    authenticator: A,
    registrations: Mutex<HashMap<String, VerifyingKey>>,
}

impl<A: Authenticator> ChallengeGate<A> {
    pub fn new(authenticator: A) -> Self {
        ChallengeGate {
            authenticator,
            registrations: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_registered(&self, user_hint: &str) -> bool {
        self.registrations
            .lock()
            .map(|r| r.contains_key(user_hint))
            .unwrap_or(false)
    }

    fn registered_key(&self, user_hint: &str) -> Result<VerifyingKey, AuthFailure> {
        let mut registrations = self
            .registrations
            .lock()
            .map_err(|_| AuthFailure::Failed("registration store poisoned".into()))?;
        if let Some(key) = registrations.get(user_hint) {
            return Ok(*key);
        }
        let key = self.authenticator.register(user_hint)?;
        debug!("registered authenticator for {}", user_hint);
        registrations.insert(user_hint.to_string(), key);
        Ok(key)
    }

    fn forget(&self, user_hint: &str) {
        if let Ok(mut registrations) = self.registrations.lock() {
            registrations.remove(user_hint);
        }
    }

    fn run(&self, user_hint: &str) -> Result<(), AuthFailure> {
        let key = self.registered_key(user_hint)?;

        let mut challenge = [0u8; 32];
        OsRng.fill_bytes(&mut challenge);
        let raw = self.authenticator.sign_challenge(&challenge)?;

        let signature = Signature::from_slice(&raw).map_err(|e| AuthFailure::Failed(e.to_string()))?;
        key.verify_prehash(&hash_data(&challenge), &signature)
            .map_err(|_| AuthFailure::Failed("signature does not match registered key".into()))
    }
}

#[async_trait]
impl<A: Authenticator> AuthenticationGate for ChallengeGate<A> {
    async fn authenticate(&self, user_hint: &str) -> GateDecision {
        if !self.authenticator.is_available() {
            return GateDecision::denied("Biometric authentication is not supported on this device.");
        }
        match self.run(user_hint) {
            Ok(()) => GateDecision::Granted,
            Err(AuthFailure::InvalidState) => {
                self.forget(user_hint);
                GateDecision::denied("Biometric profile reset. Please retry biometric auth.")
            }
            Err(AuthFailure::Cancelled) => {
                GateDecision::denied("Biometric authentication was cancelled or timed out.")
            }
            Err(AuthFailure::Unsupported) => {
                GateDecision::denied("Biometric authentication is not supported on this device.")
            }
            Err(AuthFailure::Failed(detail)) => {
                warn!("authentication for {} failed: {}", user_hint, detail);
                GateDecision::denied("Biometric authentication failed.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::key_management::KeyManager;

    /// Registers one key but signs with another.
    struct SwappedKeys {
        registered: KeyManager,
        signing: KeyManager,
    }

    impl Authenticator for SwappedKeys {
        fn register(&self, _: &str) -> Result<VerifyingKey, AuthFailure> {
            Ok(self.registered.verifying_key())
        }
        fn sign_challenge(&self, challenge: &[u8; 32]) -> Result<Vec<u8>, AuthFailure> {
            self.signing.sign_message(challenge)
        }
    }

    struct Failing(AuthFailure, bool);

    impl Authenticator for Failing {
        fn is_available(&self) -> bool {
            self.1
        }
        fn register(&self, _: &str) -> Result<VerifyingKey, AuthFailure> {
            Ok(KeyManager::generate().verifying_key())
        }
        fn sign_challenge(&self, _: &[u8; 32]) -> Result<Vec<u8>, AuthFailure> {
            Err(self.0.clone())
        }
    }

    #[tokio::test]
    async fn registered_device_is_granted() {
        let gate = ChallengeGate::new(KeyManager::generate());
        assert!(!gate.is_registered("0xabc"));
        assert_eq!(gate.authenticate("0xabc").await, GateDecision::Granted);
        assert!(gate.is_registered("0xabc"));
        assert_eq!(gate.authenticate("0xabc").await, GateDecision::Granted);
    }

    #[tokio::test]
    async fn wrong_key_is_denied() {
        let gate = ChallengeGate::new(SwappedKeys {
            registered: KeyManager::generate(),
            signing: KeyManager::generate(),
        });
        assert_eq!(
            gate.authenticate("user").await,
            GateDecision::Denied { reason: "Biometric authentication failed.".into() }
        );
    }

    #[tokio::test]
    async fn cancellation_and_unsupported_devices_are_denied() {
        let cancelled = ChallengeGate::new(Failing(AuthFailure::Cancelled, true));
        assert!(matches!(
            cancelled.authenticate("u").await,
            GateDecision::Denied { reason } if reason.contains("cancelled")
        ));

        let unsupported = ChallengeGate::new(Failing(AuthFailure::Cancelled, false));
        assert!(matches!(
            unsupported.authenticate("u").await,
            GateDecision::Denied { reason } if reason.contains("not supported")
        ));
    }

    #[tokio::test]
    async fn invalid_state_resets_registration() {
        let gate = ChallengeGate::new(Failing(AuthFailure::InvalidState, true));
        let decision = gate.authenticate("u").await;
        assert!(matches!(decision, GateDecision::Denied { ref reason } if reason.contains("reset")));
        assert!(!gate.is_registered("u"));
    }

    #[tokio::test]
    async fn required_gate_without_authenticator_fails_closed() {
        let gate = configured_gate(true, None);
        assert_eq!(
            gate.authenticate("0xabc").await,
            GateDecision::Denied {
                reason: "Biometric authentication is not supported on this device.".into()
            }
        );
    }

    #[tokio::test]
    async fn configured_gate_uses_attached_authenticator() {
        let device: Box<dyn Authenticator> = Box::new(SwappedKeys {
            registered: KeyManager::generate(),
            signing: KeyManager::generate(),
        });
        let gate = configured_gate(true, Some(device));
        assert!(matches!(gate.authenticate("u").await, GateDecision::Denied { .. }));

        let gate = configured_gate(true, Some(Box::new(KeyManager::generate())));
        assert_eq!(gate.authenticate("u").await, GateDecision::Granted);

        let open = configured_gate(false, None);
        assert_eq!(open.authenticate("u").await, GateDecision::Granted);
    }

    #[tokio::test]
    async fn open_gate_grants() {
        assert_eq!(OpenGate.authenticate("anyone").await.into_result(), Ok(()));
    }
}
