//! Defines the endpoint for updating a user's profile.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    user::{UserProfileUpdate, get_user_by_id, update_user_profile},
    validation::{ValidationErrors, require_length},
};

/// The state needed to update a user's profile.
#[derive(Clone)]
pub struct UpdateUserState {
    /// The database connection for users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateUserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for updating a user's profile.
///
/// Email and password are not part of the profile: they change through the
/// verification and password reset flows.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileData {
    /// The user's given name.
    pub firstname: String,
    /// The user's family name.
    pub lastname: String,
    /// The currency to assume when a request does not specify one.
    /// Leaving it out keeps the stored value.
    #[serde(rename = "defaultCurrency")]
    pub default_currency: Option<String>,
    /// Whether the user has completed the onboarding flow.
    /// Leaving it out keeps the stored value.
    #[serde(rename = "isOnboarded")]
    pub is_onboarded: Option<bool>,
}

/// A route handler for updating a user's profile.
///
/// Users can only update their own profile. Omitted optional fields keep
/// their stored values.
///
/// # Errors
///
/// - [Error::Validation] (400) if a field is malformed.
/// - [Error::NotResourceOwner] (401) if the path ID is not the caller's.
/// - [Error::MissingResource] (404) if the user row no longer exists.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn update_user_endpoint(
    State(state): State<UpdateUserState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateProfileData>,
) -> Result<Response, Error> {
    if user_id != auth_user.id.as_i64() {
        return Err(Error::NotResourceOwner("user"));
    }

    let mut errors = ValidationErrors::new();
    require_length(&mut errors, "firstname", &payload.firstname, 2, 30);
    require_length(&mut errors, "lastname", &payload.lastname, 2, 30);
    errors.into_result()?;

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let user = get_user_by_id(auth_user.id, &connection).map_err(|error| match error {
        Error::NotFound => Error::MissingResource("user"),
        other => other,
    })?;

    let update = UserProfileUpdate {
        first_name: payload.firstname,
        last_name: payload.lastname,
        default_currency: payload.default_currency.or(user.default_currency),
        onboarded: payload.is_onboarded.unwrap_or(user.onboarded),
    };
    update_user_profile(user.id, &update, &connection)?;

    Ok(Json(json!({"ok": true})).into_response())
}
