//! Defines the endpoint for resetting a password with an emailed code.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    otp::verify_otp,
    user::{PasswordHash, ValidatedPassword, get_user_by_email, update_user_password},
    validation::{MAX_EMAIL_LENGTH, ValidationErrors, require_email, require_otp, require_password},
};

/// The state needed to reset a password.
#[derive(Clone)]
pub struct ResetPasswordState {
    /// The database connection for users and codes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ResetPasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for resetting a password.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordData {
    /// The email the user registered with.
    pub email: String,
    /// The code from the password-reset email.
    pub otp: String,
    /// The new password in plain text.
    pub password: String,
    /// A repeat of the new password.
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

/// A route handler for resetting a password with a one-time code.
///
/// The password strength gate runs before the code is checked, so a weak
/// password does not burn the code.
///
/// # Errors
///
/// - [Error::Validation] (400) if a field is malformed.
/// - [Error::TooWeak] (400) if the new password is too easy to guess.
/// - [Error::EmailNotRegistered] (404) if no user has the given email.
/// - [Error::InvalidOtp] (400) if the code does not match or has expired.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn reset_password_endpoint(
    State(state): State<ResetPasswordState>,
    Json(request): Json<ResetPasswordData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_email(&mut errors, &request.email, MAX_EMAIL_LENGTH);
    require_otp(&mut errors, &request.otp);
    require_password(&mut errors, &request.password, Some(&request.confirm_password));
    errors.into_result()?;

    let validated_password = ValidatedPassword::new(&request.password)?;

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let user = get_user_by_email(&request.email, &connection).map_err(|error| match error {
        Error::NotFound => Error::EmailNotRegistered,
        error => error,
    })?;

    if !verify_otp(user.id, &request.otp, &connection)? {
        return Err(Error::InvalidOtp);
    }

    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;
    update_user_password(user.id, &password_hash, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "message": "Your password has been reset. You can now log in.",
    }))
    .into_response())
}
