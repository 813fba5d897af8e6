//! Host principal verification.
//!
//! Identity is owned by the platform. This module only checks the HS256
//! access tokens it issues and turns them into a [`Principal`] that every
//! matchmaking operation requires.

pub mod errors;
pub mod models;
pub mod verifier;

pub use errors::{AuthError, AuthResult};
pub use models::{Claims, Principal};
pub use verifier::TokenVerifier;
