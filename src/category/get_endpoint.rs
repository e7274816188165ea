//! Defines the endpoint for fetching a category by its slug.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    category::{get_category_by_slug, get_subcategories},
};

/// The state needed to fetch a category.
#[derive(Clone)]
pub struct GetCategoryState {
    /// The database connection for categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for fetching a category and its direct subcategories.
///
/// Slugs are shareable: this route sits outside the authentication guard so a
/// category link works without a session. The random slug suffix is what
/// keeps private categories from being enumerated.
///
/// # Errors
///
/// Returns [Error::MissingResource] (404) if no category has the given slug.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_category_endpoint(
    State(state): State<GetCategoryState>,
    Path(slug): Path<String>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let category = get_category_by_slug(&slug, &connection)?;
    let subcategories: Vec<serde_json::Value> = get_subcategories(category.id, &connection)?
        .into_iter()
        .map(|subcategory| {
            json!({
                "name": subcategory.name,
                "slug": subcategory.slug,
            })
        })
        .collect();

    Ok(Json(json!({
        "ok": true,
        "category": category,
        "subcategories": subcategories,
    }))
    .into_response())
}

#[cfg(test)]
mod get_category_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;

    use crate::{
        Error,
        category::{Category, CategoryAccess, NewCategory, create_category, create_category_table},
        user::UserId,
    };

    use super::{GetCategoryState, get_category_endpoint};

    fn seed_category(
        connection: &Connection,
        name: &str,
        ancestor_id: Option<i64>,
    ) -> Category {
        create_category(
            NewCategory {
                user_id: UserId::new(1),
                name: name.to_owned(),
                ancestor_id,
                access: CategoryAccess::Public,
            },
            connection,
        )
        .unwrap()
    }

    fn get_test_state() -> (GetCategoryState, Category) {
        let connection = Connection::open_in_memory().unwrap();
        create_category_table(&connection).unwrap();

        let parent = seed_category(&connection, "Home", None);
        seed_category(&connection, "Power", Some(parent.id));
        seed_category(&connection, "Water", Some(parent.id));
        seed_category(&connection, "Travel", None);

        (
            GetCategoryState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            parent,
        )
    }

    #[tokio::test]
    async fn get_returns_the_category_and_its_subcategories() {
        let (state, parent) = get_test_state();

        let result = get_category_endpoint(State(state), Path(parent.slug.clone())).await;

        let response = result.expect("expected a category");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["category"]["name"], "home");
        assert_eq!(body["category"]["slug"], parent.slug.as_str());

        let subcategories = body["subcategories"].as_array().unwrap();
        let names: Vec<&str> = subcategories
            .iter()
            .map(|subcategory| subcategory["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["power", "water"]);
        assert!(subcategories[0]["slug"].as_str().unwrap().starts_with("power-"));
    }

    #[tokio::test]
    async fn get_fails_for_an_unknown_slug() {
        let (state, _) = get_test_state();

        let result = get_category_endpoint(State(state), Path("home-ffffff".to_owned())).await;

        assert!(matches!(result, Err(Error::MissingResource("category"))));
    }
}
