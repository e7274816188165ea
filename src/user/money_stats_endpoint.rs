//! Defines the endpoint for a user's money statistics.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    account::{get_account_totals, get_total_account_balance},
    auth::AuthenticatedUser,
    transaction::{TransactionFilter, get_transaction_totals},
};

/// The state needed to build a user's money statistics.
#[derive(Clone)]
pub struct MoneyStatsState {
    /// The database connection for accounts and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MoneyStatsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the money statistics report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoneyStatsQuery {
    /// Restrict the report to this currency. Omitting it aggregates across
    /// every currency the user deals in.
    pub currency: Option<String>,
}

/// A route handler for a user's money statistics.
///
/// Reports the user's income and expense grand totals, the same totals per
/// account, and the combined balance of their accounts.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_money_stats_endpoint(
    State(state): State<MoneyStatsState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<MoneyStatsQuery>,
) -> Result<Response, Error> {
    let currency = query.currency.as_deref();

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let transaction_totals = get_transaction_totals(
        auth_user.id,
        &TransactionFilter {
            currency: query.currency.clone(),
            ..Default::default()
        },
        &connection,
    )?;
    let account_totals = get_account_totals(auth_user.id, currency, &connection)?;
    let total_balance = get_total_account_balance(auth_user.id, currency, &connection)?;

    let accounts: Vec<serde_json::Value> = account_totals
        .into_iter()
        .map(|totals| {
            json!({
                "name": totals.name,
                "balance": totals.balance,
                "transactions": {
                    "income": totals.income,
                    "expense": totals.expense,
                },
            })
        })
        .collect();

    Ok(Json(json!({
        "ok": true,
        "stats": {
            "txTotals": transaction_totals,
            "accounts": accounts,
            "totalAccountsBalance": total_balance,
        },
    }))
    .into_response())
}
