use serde::{Deserialize, Serialize};

/// JWT claims issued by the external identity service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Audience
    pub aud: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// User email
    pub email: String,

    /// User role as issued by the identity service
    pub role: String,
}
