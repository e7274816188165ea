//! Defines the endpoint for listing a user's debts.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    debt::{count_debts, list_debts},
    pagination::{Page, PaginationConfig, PaginationParams},
};

/// The state needed to list debts.
#[derive(Clone)]
pub struct ListDebtsState {
    /// The config for paginating lists of data.
    pub pagination_config: PaginationConfig,
    /// The database connection for debts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListDebtsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the caller's debts, newest first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn list_debts_endpoint(
    State(state): State<ListDebtsState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, Error> {
    let page = Page::resolve(params, &state.pagination_config);

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let debts = list_debts(auth_user.id, page.size, page.offset(), &connection)?;
    let total_rows = count_debts(auth_user.id, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "items": debts,
        "totalPageCount": page.total_page_count(total_rows),
    }))
    .into_response())
}
