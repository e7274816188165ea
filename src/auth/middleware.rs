//! Authentication middleware that validates bearer tokens on protected routes.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;

use crate::{
    AppState, Error,
    auth::token::decode_jwt,
    user::{Permission, UserId},
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key used to verify access token signatures.
    pub jwt_decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_decoding_key: state.jwt_decoding_key.clone(),
        }
    }
}

/// The identity taken from a verified access token.
///
/// Route handlers behind [auth_guard] receive this with
/// `Extension(user): Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    /// The id of the user the token was issued to.
    pub id: UserId,
    /// The email address in the token.
    pub email: String,
    /// The feature tier in the token.
    pub permission: Permission,
}

/// Middleware function that checks for a valid bearer token in the
/// Authorization header.
///
/// On success the request runs normally with an [AuthenticatedUser] extension
/// inserted; otherwise the response is a 401 with the JSON error envelope.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(_) => return Error::InvalidToken.into_response(),
        };

    let claims = match decode_jwt(bearer.token(), &state.jwt_decoding_key) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(AuthenticatedUser {
        id: UserId::new(claims.sub),
        email: claims.email,
        permission: claims.permission,
    });

    next.run(Request::from_parts(parts, body)).await
}
