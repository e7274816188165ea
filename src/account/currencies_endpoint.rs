//! Defines the endpoint for listing the currencies across a user's accounts.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{AppState, Error, account::get_account_currencies, auth::AuthenticatedUser};

/// The state needed to list account currencies.
#[derive(Clone)]
pub struct AccountCurrenciesState {
    /// The database connection for accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountCurrenciesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the distinct currencies over the caller's
/// accounts.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_account_currencies_endpoint(
    State(state): State<AccountCurrenciesState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Response, Error> {
    let currencies = get_account_currencies(
        auth_user.id,
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )?;

    Ok(Json(json!({
        "ok": true,
        "currencies": currencies,
    }))
    .into_response())
}
