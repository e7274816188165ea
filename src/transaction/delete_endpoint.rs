//! Defines the endpoint for deleting a transaction.
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
    ledger,
    transaction::{delete_transaction, get_owned_transaction},
};

/// The state needed to delete a transaction.
#[derive(Clone)]
pub struct DeleteTransactionState {
    /// The database connection for transactions and accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the caller's transactions.
///
/// The transaction's contribution is backed out of its account's balance
/// through the ledger: deleting an expense restores the money, deleting an
/// income removes it.
///
/// # Errors
///
/// - [Error::MissingResource] (404) if no transaction has the given ID.
/// - [Error::NotResourceOwner] (401) if the transaction belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let transaction = get_owned_transaction(transaction_id, auth_user.id, &connection)?;
    delete_transaction(transaction.id, &connection)?;
    ledger::reconcile_on_delete(&transaction, &connection)?;

    Ok(Json(json!({"ok": true})).into_response())
}
