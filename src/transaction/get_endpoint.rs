//! Defines the endpoint for fetching a single transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    database_id::TransactionId,
    transaction::get_owned_transaction,
};

/// The state needed to fetch a transaction.
#[derive(Clone)]
pub struct GetTransactionState {
    /// The database connection for transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for fetching one of the caller's transactions.
///
/// # Errors
///
/// - [Error::MissingResource] (404) if no transaction has the given ID.
/// - [Error::NotResourceOwner] (401) if the transaction belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_transaction_endpoint(
    State(state): State<GetTransactionState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let transaction = get_owned_transaction(
        transaction_id,
        auth_user.id,
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )?;

    Ok(Json(json!({
        "ok": true,
        "transaction": transaction,
    }))
    .into_response())
}
