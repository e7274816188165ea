//! Defines the endpoint for creating an account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    account::{NewAccount, create_account},
    auth::AuthenticatedUser,
    validation::{ValidationErrors, require_length, require_non_negative, require_present},
};

/// The state needed to create an account.
#[derive(Clone)]
pub struct CreateAccountState {
    /// The database connection for accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for creating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountData {
    /// The display name of the account.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// The account number at the provider.
    pub number: Option<String>,
    /// The institution holding the account.
    pub provider: Option<String>,
    /// The kind of account, e.g. "checking" or "savings".
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    /// The ISO currency code for the account.
    pub currency: String,
    /// The opening balance. Defaults to zero.
    pub balance: Option<f64>,
}

/// A route handler for creating a new account.
///
/// The opening balance becomes the account's first balance history snapshot.
///
/// # Errors
///
/// Returns [Error::Validation] (400) if a field is malformed.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateAccountData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_length(&mut errors, "name", &payload.name, 3, 256);
    require_present(&mut errors, "currency", &payload.currency);
    if let Some(balance) = payload.balance {
        require_non_negative(&mut errors, "balance", balance);
    }
    errors.into_result()?;

    let account = create_account(
        NewAccount {
            user_id: auth_user.id,
            name: payload.name,
            description: payload.description,
            number: payload.number,
            provider: payload.provider,
            account_type: payload.account_type,
            currency: payload.currency,
            balance: payload.balance.unwrap_or(0.0),
        },
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "accountId": account.id,
        })),
    )
        .into_response())
}
