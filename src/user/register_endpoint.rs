//! Defines the endpoint for registering a new user.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    email::{Mailer, VERIFICATION_SUBJECT, verification_email},
    otp::new_otp,
    user::{NewUser, PasswordHash, ValidatedPassword, insert_user},
    validation::{
        MAX_REGISTRATION_EMAIL_LENGTH, ValidationErrors, require_email, require_length,
        require_password,
    },
};

/// The state needed to register a user.
#[derive(Clone)]
pub struct RegisterState {
    /// The transport used to send the verification email.
    pub mailer: Mailer,
    /// The database connection for users and codes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegisterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            mailer: state.mailer.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    /// The user's given name.
    pub firstname: String,
    /// The user's family name.
    pub lastname: String,
    /// The email address to register.
    pub email: String,
    /// The password in plain text.
    pub password: String,
    /// A repeat of the password.
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

/// A route handler for registering a new user.
///
/// Creates the user unverified, issues a one-time password, and emails it to
/// the new address. The user cannot log in until they verify.
///
/// # Errors
///
/// - [Error::Validation] (400) if a field is malformed.
/// - [Error::TooWeak] (400) if the password is too easy to guess.
/// - [Error::DuplicateEmail] (400) if the email is already registered.
/// - [Error::MailError] (500) if the verification email could not be handed
///   to the relay.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn register_user_endpoint(
    State(state): State<RegisterState>,
    Json(registration): Json<RegisterData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_length(&mut errors, "firstname", &registration.firstname, 2, 30);
    require_length(&mut errors, "lastname", &registration.lastname, 2, 30);
    require_email(&mut errors, &registration.email, MAX_REGISTRATION_EMAIL_LENGTH);
    require_password(
        &mut errors,
        &registration.password,
        Some(&registration.confirm_password),
    );
    errors.into_result()?;

    let validated_password = ValidatedPassword::new(&registration.password)?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let (user, otp) = {
        let connection = state
            .db_connection
            .lock()
            .expect("could not acquire database lock");

        let user = insert_user(
            NewUser {
                first_name: registration.firstname,
                last_name: registration.lastname,
                email: registration.email,
                password_hash,
            },
            &connection,
        )?;
        let otp = new_otp(user.id, &connection)?;

        (user, otp)
    };

    state.mailer.send(
        &user.email,
        VERIFICATION_SUBJECT,
        verification_email(&user.first_name, &otp.value),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "userId": user.id,
        })),
    )
        .into_response())
}
