//! Defines the endpoint for deleting a property listing.
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
    database_id::DatabaseId,
    property::{delete_property, get_owned_property},
};

/// The state needed to delete a property.
#[derive(Clone)]
pub struct DeletePropertyState {
    /// The database connection for properties.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeletePropertyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the caller's properties.
///
/// # Errors
///
/// - [Error::MissingResource] (404) if no property has the given ID.
/// - [Error::NotResourceOwner] (401) if the property belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_property_endpoint(
    State(state): State<DeletePropertyState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(property_id): Path<DatabaseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let property = get_owned_property(property_id, auth_user.id, &connection)?;
    delete_property(property.id, &connection)?;

    Ok(Json(json!({"ok": true})).into_response())
}
