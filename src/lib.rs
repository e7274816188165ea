//! Moneta is a personal-finance backend: users register, verify their email
//! with a one-time password, and manage accounts, transactions, categories,
//! properties, and debts over a JSON REST API.
//!
//! Account balances are owned by the [ledger] module: every transaction
//! create, update, and delete adjusts the target account's balance atomically,
//! clamps it at zero, and appends a balance-history snapshot.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod balance_history;
mod category;
mod database_id;
mod db;
mod debt;
mod email;
mod endpoints;
mod ledger;
mod otp;
mod pagination;
mod property;
mod routing;
#[cfg(test)]
mod test_utils;
mod transaction;
mod user;
mod validation;

pub use account::{Account, NewAccount, create_account};
pub use app_state::AppState;
pub use category::{CategoryAccess, NewCategory, create_category};
pub use db::initialize as initialize_db;
pub use email::{Mailer, SmtpConfig};
pub use ledger::reconcile_on_create;
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use transaction::{NewTransaction, Transaction, TransactionType, create_transaction};
pub use user::{
    NewUser, PasswordHash, User, UserId, ValidatedPassword, get_user_by_email, insert_user,
    mark_user_verified, update_user_password,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an email and password combination that does not
    /// match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The user tried to log in before verifying their email address.
    #[error("the user has not verified their email address")]
    AccountNotVerified,

    /// No user is registered with the given email address.
    #[error("no user is registered with this email")]
    EmailNotRegistered,

    /// The email used to register already belongs to another user.
    #[error("a user with this email already exists")]
    DuplicateEmail,

    /// The one-time password did not match or has expired.
    #[error("the one-time password is incorrect or has expired")]
    InvalidOtp,

    /// The bearer token is missing, malformed, expired, or signed with the
    /// wrong key.
    #[error("invalid auth token")]
    InvalidToken,

    /// Signing a new JSON web token failed.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("could not create auth token: {0}")]
    TokenCreation(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested row does not exist. Holds the resource name in lowercase,
    /// e.g. "account".
    #[error("the {0} does not exist")]
    MissingResource(&'static str),

    /// The requested row exists but belongs to another user. Holds the
    /// resource name in lowercase, e.g. "account".
    #[error("the {0} belongs to another user")]
    NotResourceOwner(&'static str),

    /// A transaction referenced an account with a different currency.
    #[error("transaction and account have different currencies")]
    CurrencyMismatch,

    /// The category name already exists.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// An outbound email could not be handed to the SMTP relay.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("could not send email: {0}")]
    MailError(String),

    /// One or more request fields failed validation. Holds the map of field
    /// name to message rendered as the `errors` object in the response.
    #[error("one or more fields failed validation")]
    Validation(validation::ValidationErrors),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Validation failures use their own envelope with per-field messages.
        if let Error::Validation(errors) = self {
            return errors.into_response();
        }

        let (status, message) = match &self {
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Incorrect email or password.".to_owned(),
            ),
            Error::InvalidToken => (StatusCode::UNAUTHORIZED, "Log in to continue.".to_owned()),
            Error::NotResourceOwner(resource) => (
                StatusCode::UNAUTHORIZED,
                format!("You are not authorized to access this {resource}."),
            ),
            Error::AccountNotVerified => (
                StatusCode::BAD_REQUEST,
                "Please verify your email address, then try again.".to_owned(),
            ),
            Error::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                "A user with this email already exists.".to_owned(),
            ),
            Error::InvalidOtp => (
                StatusCode::BAD_REQUEST,
                "The code is incorrect or has expired. Request a new one and try again."
                    .to_owned(),
            ),
            Error::CurrencyMismatch => (
                StatusCode::BAD_REQUEST,
                "Transaction and account have different currencies.".to_owned(),
            ),
            Error::DuplicateCategoryName(name) => (
                StatusCode::BAD_REQUEST,
                format!("The category \"{name}\" already exists."),
            ),
            Error::TooWeak(feedback) => (StatusCode::BAD_REQUEST, feedback.clone()),
            Error::EmailNotRegistered => (
                StatusCode::NOT_FOUND,
                "No user is registered with this email.".to_owned(),
            ),
            Error::MissingResource(resource) => (
                StatusCode::NOT_FOUND,
                format!("The {resource} does not exist."),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "The requested resource could not be found.".to_owned(),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Try again later.".to_owned(),
                )
            }
        };

        (
            status,
            Json(json!({
                "ok": false,
                "message": message,
                "status": status.as_u16(),
            })),
        )
            .into_response()
    }
}
