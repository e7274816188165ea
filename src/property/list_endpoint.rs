//! Defines the endpoint for listing a user's properties.
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
    pagination::{Page, PaginationConfig, PaginationParams},
    property::{count_properties, list_properties},
};

/// The state needed to list properties.
#[derive(Clone)]
pub struct ListPropertiesState {
    /// The config for paginating lists of data.
    pub pagination_config: PaginationConfig,
    /// The database connection for properties.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListPropertiesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the caller's properties, newest first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn list_properties_endpoint(
    State(state): State<ListPropertiesState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, Error> {
    let page = Page::resolve(params, &state.pagination_config);

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let properties = list_properties(auth_user.id, page.size, page.offset(), &connection)?;
    let total_rows = count_properties(auth_user.id, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "items": properties,
        "totalPageCount": page.total_page_count(total_rows),
    }))
    .into_response())
}

#[cfg(test)]
mod list_properties_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
    };
    use rusqlite::Connection;

    use crate::{
        auth::AuthenticatedUser,
        pagination::{PaginationConfig, PaginationParams},
        property::{NewProperty, PropertyStatus, PropertyType, create_property, create_property_table},
        user::{Permission, UserId},
    };

    use super::{ListPropertiesState, list_properties_endpoint};

    fn get_test_state(property_count: usize) -> ListPropertiesState {
        let connection = Connection::open_in_memory().unwrap();
        create_property_table(&connection).unwrap();

        for number in 1..=property_count {
            create_property(
                NewProperty {
                    user_id: UserId::new(1),
                    name: format!("Listing {number}"),
                    description: "A listing.".to_owned(),
                    property_type: PropertyType::Rent,
                    price: 500.0,
                    currency: None,
                    room_count: None,
                    bed_count: None,
                    area: None,
                    status: PropertyStatus::Active,
                },
                &connection,
            )
            .unwrap();
        }

        ListPropertiesState {
            pagination_config: PaginationConfig::default(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn auth_user() -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(1),
            email: "ada@example.com".to_owned(),
            permission: Permission::Normal,
        }
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let state = get_test_state(12);

        let result = list_properties_endpoint(
            State(state),
            Extension(auth_user()),
            Query(PaginationParams::default()),
        )
        .await;

        let response = result.expect("expected a property list");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 10);
        assert_eq!(items[0]["name"], "Listing 12");
        assert_eq!(body["totalPageCount"], 2);
    }
}
