//! Defines the endpoint for fetching a user's profile.
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
    user::{UserProfile, get_user_by_id},
};

/// The state needed to fetch a user's profile.
#[derive(Clone)]
pub struct GetUserState {
    /// The database connection for users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetUserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for fetching a user's profile.
///
/// Users can only fetch their own profile.
///
/// # Errors
///
/// - [Error::NotResourceOwner] (401) if the path ID is not the caller's.
/// - [Error::MissingResource] (404) if the user row no longer exists.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_user_endpoint(
    State(state): State<GetUserState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
) -> Result<Response, Error> {
    if user_id != auth_user.id.as_i64() {
        return Err(Error::NotResourceOwner("user"));
    }

    let user = get_user_by_id(
        auth_user.id,
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )
    .map_err(|error| match error {
        Error::NotFound => Error::MissingResource("user"),
        other => other,
    })?;

    Ok(Json(json!({
        "ok": true,
        "user": UserProfile::from(&user),
    }))
    .into_response())
}
