//! Defines the endpoint for fetching a single debt.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{AppState, Error, auth::AuthenticatedUser, database_id::DatabaseId, debt::get_owned_debt};

/// The state needed to fetch a debt.
#[derive(Clone)]
pub struct GetDebtState {
    /// The database connection for debts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetDebtState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for fetching one of the caller's debts.
///
/// # Errors
///
/// - [Error::MissingResource] (404) if no debt has the given ID.
/// - [Error::NotResourceOwner] (401) if the debt belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_debt_endpoint(
    State(state): State<GetDebtState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(debt_id): Path<DatabaseId>,
) -> Result<Response, Error> {
    let debt = get_owned_debt(
        debt_id,
        auth_user.id,
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )?;

    Ok(Json(json!({
        "ok": true,
        "debt": debt,
    }))
    .into_response())
}
