pub mod api_server;
pub mod credential_issuer;
pub mod disclosure;
pub mod extraction;
pub mod interaction;
pub mod verifier;

pub use credential_issuer::{CredentialIssuer, IssuedCredential};
pub use disclosure::{disclose, DisclosureAllowList, DisclosureService};
pub use extraction::{DocumentExtractor, GeminiExtractor};
pub use interaction::InteractionService;
pub use verifier::{IntegrityChecker, VerificationReport, Verifier};
