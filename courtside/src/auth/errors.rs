//! Authentication error types.

use thiserror::Error;

/// Token verification errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token on the request
    #[error("Missing bearer token")]
    MissingToken,

    /// Subject claim is not a valid user ID
    #[error("Invalid token subject")]
    InvalidSubject,

    /// JWT token error
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak token internals
    pub fn client_message(&self) -> String {
        match self {
            AuthError::JwtError(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token expired".to_string(),
                _ => "Authentication failed".to_string(),
            },
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
