//! Defines the endpoint for logging in with an email and password.
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
    auth::token::encode_jwt,
    user::{UserProfile, get_user_by_email},
    validation::{MAX_EMAIL_LENGTH, ValidationErrors, require_email},
};

/// The state needed to log a user in.
#[derive(Clone)]
pub struct LogInState {
    /// The key used to sign access tokens.
    pub jwt_encoding_key: EncodingKey,
    /// How long a new access token stays valid.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_encoding_key: state.jwt_encoding_key.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials sent by the client to log in.
#[derive(Debug, Clone, Deserialize)]
pub struct LogInData {
    /// The email the user registered with.
    pub email: String,
    /// The user's password in plain text.
    pub password: String,
}

/// A route handler for logging in a user.
///
/// Responds with a fresh access token and the user's public profile.
///
/// # Errors
///
/// - [Error::Validation] (400) if the email or password field is malformed.
/// - [Error::EmailNotRegistered] (404) if no user has the given email.
/// - [Error::AccountNotVerified] (400) if the user has not verified their
///   email address.
/// - [Error::InvalidCredentials] (401) if the password does not match.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn log_in_endpoint(
    State(state): State<LogInState>,
    Json(credentials): Json<LogInData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_email(&mut errors, &credentials.email, MAX_EMAIL_LENGTH);
    if credentials.password.is_empty() {
        errors.add("password", "The password is required.");
    }
    errors.into_result()?;

    let user = get_user_by_email(
        &credentials.email,
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )
    .map_err(|error| match error {
        Error::NotFound => Error::EmailNotRegistered,
        error => error,
    })?;

    if !user.verified {
        return Err(Error::AccountNotVerified);
    }

    let password_matches = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !password_matches {
        return Err(Error::InvalidCredentials);
    }

    let access_token = encode_jwt(&user, state.token_duration, &state.jwt_encoding_key)?;

    Ok(Json(json!({
        "ok": true,
        "accessToken": access_token,
        "user": UserProfile::from(&user),
    }))
    .into_response())
}
