pub mod auth_gate;
pub mod key_management;

pub use auth_gate::{configured_gate, AuthenticationGate, ChallengeGate, GateDecision, NoAuthenticator, OpenGate};
pub use key_management::KeyManager;
