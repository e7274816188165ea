//! Defines the endpoint for fetching a single property.
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
    property::get_owned_property,
};

/// The state needed to fetch a property.
#[derive(Clone)]
pub struct GetPropertyState {
    /// The database connection for properties.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetPropertyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for fetching one of the caller's properties.
///
/// # Errors
///
/// - [Error::MissingResource] (404) if no property has the given ID.
/// - [Error::NotResourceOwner] (401) if the property belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_property_endpoint(
    State(state): State<GetPropertyState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(property_id): Path<DatabaseId>,
) -> Result<Response, Error> {
    let property = get_owned_property(
        property_id,
        auth_user.id,
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )?;

    Ok(Json(json!({
        "ok": true,
        "property": property,
    }))
    .into_response())
}
