//! Defines the endpoint for requesting a password-reset code.
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
    email::{Mailer, PASSWORD_RESET_SUBJECT, password_reset_email},
    otp::new_otp,
    user::get_user_by_email,
};

/// The state needed to issue a password-reset code.
#[derive(Clone)]
pub struct ForgotPasswordState {
    /// The transport used to send the reset email.
    pub mailer: Mailer,
    /// The database connection for users and codes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ForgotPasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            mailer: state.mailer.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for a password-reset code.
#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordData {
    /// The email the user registered with.
    pub email: String,
}

/// A route handler for requesting a password-reset code by email.
///
/// Issues a fresh one-time password, replacing any earlier code, and sends it
/// to the user's email address.
///
/// # Errors
///
/// - [Error::EmailNotRegistered] (404) if no user has the given email.
/// - [Error::MailError] (500) if the reset email could not be handed to the
///   relay.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn forgot_password_endpoint(
    State(state): State<ForgotPasswordState>,
    Json(request): Json<ForgotPasswordData>,
) -> Result<Response, Error> {
    // Issue the code while holding the lock; send after releasing it.
    let (user, otp) = {
        let connection = state
            .db_connection
            .lock()
            .expect("could not acquire database lock");

        let user = get_user_by_email(&request.email, &connection).map_err(|error| match error {
            Error::NotFound => Error::EmailNotRegistered,
            error => error,
        })?;
        let otp = new_otp(user.id, &connection)?;

        (user, otp)
    };

    state.mailer.send(
        &user.email,
        PASSWORD_RESET_SUBJECT,
        password_reset_email(&user.first_name, &otp.value),
    )?;

    Ok(Json(json!({
        "ok": true,
        "message": "A reset code has been sent to your email.",
    }))
    .into_response())
}
