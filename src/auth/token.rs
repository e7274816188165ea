//! Access tokens: the claims they carry, signing, and verification.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    user::{Permission, User},
};

/// How long an access token stays valid after signing.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(24);

/// The claims carried in an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The id of the user the token was issued to.
    pub sub: i64,
    /// The email address of the user at the time of issue.
    pub email: String,
    /// The user's feature tier at the time of issue.
    pub permission: Permission,
    /// When the token was issued, as a unix timestamp.
    pub iat: i64,
    /// When the token expires, as a unix timestamp.
    pub exp: i64,
}

/// Sign an access token for `user` that expires after `token_duration`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the claims could not be signed.
pub fn encode_jwt(
    user: &User,
    token_duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let issued_at = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user.id.as_i64(),
        email: user.email.clone(),
        permission: user.permission,
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + token_duration).unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify an access token's signature and expiry, returning its claims.
///
/// # Errors
/// Returns [Error::InvalidToken] if the token is malformed, expired, or was
/// signed with a different key.
pub fn decode_jwt(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::new(Algorithm::HS256))
        .map(|token_data| token_data.claims)
        .map_err(|_| Error::InvalidToken)
}
