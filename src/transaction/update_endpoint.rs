//! Defines the endpoint for updating a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountId, get_owned_account},
    auth::AuthenticatedUser,
    database_id::TransactionId,
    ledger,
    transaction::{TransactionType, TransactionUpdate, get_owned_transaction, update_transaction},
    validation::{
        ValidationErrors, require_length, require_non_negative, require_positive, require_present,
    },
};

/// The state needed to update a transaction.
#[derive(Clone)]
pub struct UpdateTransactionState {
    /// The database connection for transactions and accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for updating a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTransactionData {
    /// The account to charge the transaction to.
    pub account: Option<AccountId>,
    /// A short label for the transaction.
    pub title: String,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The amount of money spent or earned. Must be positive.
    pub amount: f64,
    /// Extra money on top of `amount`. Defaults to zero.
    pub cost: Option<f64>,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The ISO currency code for the transaction.
    pub currency: String,
    /// The category label.
    pub category: Option<String>,
    /// When the transaction happened.
    pub date: Date,
}

/// A route handler for updating one of the caller's transactions.
///
/// Account balances follow the edit through the ledger: staying on the same
/// account applies the net difference in one step, while moving to a
/// different account reverses the old contribution and applies the new one.
///
/// # Errors
///
/// - [Error::Validation] (400) if a field is malformed.
/// - [Error::MissingResource] (404) if the transaction or account does not exist.
/// - [Error::NotResourceOwner] (401) if either belongs to another user.
/// - [Error::CurrencyMismatch] (400) if the account uses another currency.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn update_transaction_endpoint(
    State(state): State<UpdateTransactionState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(transaction_id): Path<TransactionId>,
    Json(payload): Json<UpdateTransactionData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_length(&mut errors, "title", &payload.title, 3, 256);
    require_positive(&mut errors, "amount", payload.amount);
    if let Some(cost) = payload.cost {
        require_non_negative(&mut errors, "cost", cost);
    }
    require_present(&mut errors, "currency", &payload.currency);
    let Some(transaction_type) = TransactionType::parse(&payload.transaction_type) else {
        errors.add("type", "The type must be income or expense.");
        return Err(errors.into());
    };
    errors.into_result()?;

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let old_transaction = get_owned_transaction(transaction_id, auth_user.id, &connection)?;

    if let Some(account_id) = payload.account {
        let account = get_owned_account(account_id, auth_user.id, &connection)?;

        if account.currency != payload.currency {
            return Err(Error::CurrencyMismatch);
        }
    }

    let update = TransactionUpdate {
        account_id: payload.account,
        title: payload.title,
        description: payload.description,
        amount: payload.amount,
        cost: payload.cost.unwrap_or(0.0),
        transaction_type,
        currency: payload.currency,
        category: payload.category,
        date: payload.date,
    };

    update_transaction(old_transaction.id, &update, &connection)?;
    ledger::reconcile_on_mutation(&old_transaction, &update, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "transactionId": old_transaction.id,
    }))
    .into_response())
}
