//! Defines the endpoint for creating a category.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    category::{CategoryAccess, NewCategory, create_category, get_category_by_slug},
    validation::{ValidationErrors, require_length},
};

/// The state needed to create a category.
#[derive(Clone)]
pub struct CreateCategoryState {
    /// The database connection for categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryData {
    /// The category name. Lowercased before storage.
    pub name: String,
    /// The slug of the parent category, if this is a subcategory.
    pub ancestor: Option<String>,
    /// Who can see the category, `private` or `public`. Defaults to private.
    pub access: Option<String>,
}

/// A route handler for creating a new category.
///
/// Names are stored lowercase and must be unique across all users. The
/// response carries the generated slug, which is how the category is
/// addressed from then on.
///
/// # Errors
///
/// - [Error::Validation] (400) if the name is malformed.
/// - [Error::DuplicateCategoryName] (400) if the name is already taken.
/// - [Error::MissingResource] (404) if the ancestor slug does not exist.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateCategoryData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_length(&mut errors, "name", &payload.name, 2, 64);
    errors.into_result()?;

    let access = payload
        .access
        .as_deref()
        .map(CategoryAccess::from_str_or_default)
        .unwrap_or_default();

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    // An empty ancestor means no parent.
    let ancestor_id = match payload.ancestor.as_deref() {
        None | Some("") => None,
        Some(slug) => Some(get_category_by_slug(slug, &connection)?.id),
    };

    let category = create_category(
        NewCategory {
            user_id: auth_user.id,
            name: payload.name,
            ancestor_id,
            access,
        },
        &connection,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "categoryId": category.id,
            "slug": category.slug,
        })),
    )
        .into_response())
}
