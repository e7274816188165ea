//! Defines the endpoint for listing a user's transactions.
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
    account::AccountId,
    auth::AuthenticatedUser,
    pagination::{Page, PaginationConfig, PaginationParams},
    transaction::{
        TransactionFilter, TransactionType, count_transactions, get_transaction_totals,
        list_transactions,
    },
    validation::ValidationErrors,
};

/// The state needed to list transactions.
#[derive(Clone)]
pub struct ListTransactionsState {
    /// The config for paginating lists of data.
    pub pagination_config: PaginationConfig,
    /// The database connection for transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters accepted by the transaction list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionListParams {
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The number of rows per page.
    pub limit: Option<u64>,
    /// Only transactions charged to this account.
    pub account: Option<AccountId>,
    /// Only `income` or only `expense` transactions.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Only transactions with this category label.
    pub category: Option<String>,
}

/// A route handler for listing the caller's transactions, most recent date
/// first.
///
/// The response carries the page of transactions, the income and expense
/// grand totals over everything the filters match, and the total page count.
///
/// # Errors
///
/// Returns [Error::Validation] (400) if the type filter is not `income` or
/// `expense`.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<TransactionListParams>,
) -> Result<Response, Error> {
    let page = Page::resolve(
        PaginationParams {
            page: params.page,
            limit: params.limit,
        },
        &state.pagination_config,
    );

    let transaction_type = match params.transaction_type.as_deref() {
        None => None,
        Some(value) => match TransactionType::parse(value) {
            Some(transaction_type) => Some(transaction_type),
            None => {
                let mut errors = ValidationErrors::new();
                errors.add("type", "The type must be income or expense.");
                return Err(errors.into());
            }
        },
    };

    let filter = TransactionFilter {
        account_id: params.account,
        transaction_type,
        category: params.category,
        currency: None,
    };

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let transactions = list_transactions(
        auth_user.id,
        &filter,
        page.size,
        page.offset(),
        &connection,
    )?;
    let total_rows = count_transactions(auth_user.id, &filter, &connection)?;
    let stats = get_transaction_totals(auth_user.id, &filter, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "transactions": transactions,
        "stats": stats,
        "totalPageCount": page.total_page_count(total_rows),
    }))
    .into_response())
}
