//! Identity boundary: access-token verification.
//!
//! Registration, login, and credential storage live with the external
//! identity provider. The engine only needs to resolve a bearer token into
//! an authenticated user id before accepting a subscription or request;
//! unauthenticated connections are rejected at subscribe time.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::AccessTokenClaims;
