#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod forwarded;
mod permission;
mod verifier;

pub use error::AuthError;
pub use forwarded::{apply_forwarded_identity, dev_principal, forwarded_principal, strip_identity_headers};
pub use permission::{PermissionEvaluator, Protected};
pub use verifier::TokenVerifier;
