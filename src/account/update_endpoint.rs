//! Defines the endpoint for updating an account's metadata.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    account::{AccountId, AccountUpdate, get_owned_account, update_account},
    auth::AuthenticatedUser,
    validation::{ValidationErrors, require_length, require_present},
};

/// The state needed to update an account.
#[derive(Clone)]
pub struct UpdateAccountState {
    /// The database connection for accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for updating an account.
///
/// The balance is deliberately absent: it only moves when transactions do.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAccountData {
    /// The display name of the account.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// The account number at the provider.
    pub number: Option<String>,
    /// The institution holding the account.
    pub provider: Option<String>,
    /// The kind of account.
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    /// The ISO currency code for the account.
    pub currency: String,
}

/// A route handler for updating an account's metadata.
///
/// # Errors
///
/// - [Error::Validation] (400) if a field is malformed.
/// - [Error::MissingResource] (404) if no account has the given ID.
/// - [Error::NotResourceOwner] (401) if the account belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn update_account_endpoint(
    State(state): State<UpdateAccountState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(account_id): Path<AccountId>,
    Json(payload): Json<UpdateAccountData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_length(&mut errors, "name", &payload.name, 3, 256);
    require_present(&mut errors, "currency", &payload.currency);
    errors.into_result()?;

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let account = get_owned_account(account_id, auth_user.id, &connection)?;
    update_account(
        account.id,
        &AccountUpdate {
            name: payload.name,
            description: payload.description,
            number: payload.number,
            provider: payload.provider,
            account_type: payload.account_type,
            currency: payload.currency,
        },
        &connection,
    )?;

    Ok(Json(json!({
        "ok": true,
        "accountId": account.id,
    }))
    .into_response())
}
