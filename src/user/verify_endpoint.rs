//! Defines the endpoint for verifying a user's email address.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Duration;

use crate::{
    AppState, Error,
    auth::encode_jwt,
    otp::verify_otp,
    user::{UserProfile, get_user_by_email, mark_user_verified},
    validation::{MAX_EMAIL_LENGTH, ValidationErrors, require_email, require_otp},
};

/// The state needed to verify a user's email address.
#[derive(Clone)]
pub struct VerifyState {
    /// The key used to sign access tokens.
    pub jwt_encoding_key: EncodingKey,
    /// How long issued access tokens stay valid.
    pub token_duration: Duration,
    /// The database connection for users and codes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for VerifyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_encoding_key: state.jwt_encoding_key.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for verifying an email address.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyData {
    /// The email address to verify.
    pub email: String,
    /// The one-time password from the verification email.
    pub otp: String,
}

/// A route handler for verifying a user's email address.
///
/// Redeems the one-time password, marks the user verified, and logs them in
/// by returning an access token alongside their profile.
///
/// # Errors
///
/// - [Error::Validation] (400) if a field is malformed.
/// - [Error::EmailNotRegistered] (404) if no user has the given email.
/// - [Error::InvalidOtp] (400) if the code does not match or has expired.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn verify_user_endpoint(
    State(state): State<VerifyState>,
    Json(request): Json<VerifyData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_email(&mut errors, &request.email, MAX_EMAIL_LENGTH);
    require_otp(&mut errors, &request.otp);
    errors.into_result()?;

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let mut user = get_user_by_email(&request.email, &connection).map_err(|error| match error {
        Error::NotFound => Error::EmailNotRegistered,
        other => other,
    })?;

    if !verify_otp(user.id, &request.otp, &connection)? {
        return Err(Error::InvalidOtp);
    }

    mark_user_verified(user.id, &connection)?;
    user.verified = true;

    let access_token = encode_jwt(&user, state.token_duration, &state.jwt_encoding_key)?;

    Ok(Json(json!({
        "ok": true,
        "accessToken": access_token,
        "user": UserProfile::from(&user),
    }))
    .into_response())
}
