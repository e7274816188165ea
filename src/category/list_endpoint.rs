//! Defines the endpoint for listing categories.
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
    category::{count_categories, list_categories},
    pagination::{Page, PaginationConfig, PaginationParams},
};

/// The state needed to list categories.
#[derive(Clone)]
pub struct ListCategoriesState {
    /// The config for paginating lists of data.
    pub pagination_config: PaginationConfig,
    /// The database connection for categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListCategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the categories visible to the caller: every
/// public category plus their own private ones, in name order.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn list_categories_endpoint(
    State(state): State<ListCategoriesState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, Error> {
    let page = Page::resolve(params, &state.pagination_config);

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let categories = list_categories(auth_user.id, page.size, page.offset(), &connection)?;
    let total_rows = count_categories(auth_user.id, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "items": categories,
        "totalPageCount": page.total_page_count(total_rows),
    }))
    .into_response())
}
