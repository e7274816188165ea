//! Defines the endpoint for creating a property listing.
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
    property::{NewProperty, PropertyStatus, PropertyType, create_property},
    validation::{ValidationErrors, require_length, require_positive, require_present},
};

/// The state needed to create a property.
#[derive(Clone)]
pub struct CreatePropertyState {
    /// The database connection for properties.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreatePropertyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for creating a property.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePropertyData {
    /// The display name of the property.
    pub name: String,
    /// A description of the property.
    pub description: String,
    /// Whether the property is for sale or rent.
    #[serde(rename = "type")]
    pub property_type: String,
    /// The asking price, or rent per period. Must be positive.
    pub price: f64,
    /// The ISO currency code for the price.
    pub currency: Option<String>,
    /// The number of rooms.
    #[serde(rename = "roomCount")]
    pub room_count: Option<i64>,
    /// The number of bedrooms.
    #[serde(rename = "bedCount")]
    pub bed_count: Option<i64>,
    /// The floor area in square meters.
    pub area: Option<f64>,
    /// Whether the listing is still available. Defaults to active.
    pub status: Option<String>,
}

/// A route handler for creating a new property listing.
///
/// # Errors
///
/// Returns [Error::Validation] (400) if a field is malformed.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_property_endpoint(
    State(state): State<CreatePropertyState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(payload): Json<CreatePropertyData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_length(&mut errors, "name", &payload.name, 3, 256);
    require_present(&mut errors, "description", &payload.description);
    require_positive(&mut errors, "price", payload.price);
    let Some(property_type) = PropertyType::parse(&payload.property_type) else {
        errors.add("type", "The type must be sale or rent.");
        return Err(errors.into());
    };
    errors.into_result()?;

    let status = payload
        .status
        .as_deref()
        .map(PropertyStatus::from_str_or_default)
        .unwrap_or_default();

    let property = create_property(
        NewProperty {
            user_id: auth_user.id,
            name: payload.name,
            description: payload.description,
            property_type,
            price: payload.price,
            currency: payload.currency,
            room_count: payload.room_count,
            bed_count: payload.bed_count,
            area: payload.area,
            status,
        },
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "property": property,
        })),
    )
        .into_response())
}

#[cfg(test)]
mod create_property_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::AuthenticatedUser,
        property::{PropertyType, create_property_table, get_owned_property},
        user::{Permission, UserId},
    };

    use super::{CreatePropertyData, CreatePropertyState, create_property_endpoint};

    fn get_test_state() -> CreatePropertyState {
        let connection = Connection::open_in_memory().unwrap();
        create_property_table(&connection).unwrap();

        CreatePropertyState {
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

    fn payload() -> CreatePropertyData {
        CreatePropertyData {
            name: "Park View Unit".to_owned(),
            description: "Two bedroom unit near the park.".to_owned(),
            property_type: "rent".to_owned(),
            price: 650.0,
            currency: Some("NZD".to_owned()),
            room_count: Some(4),
            bed_count: Some(2),
            area: Some(78.5),
            status: None,
        }
    }

    #[tokio::test]
    async fn create_stores_the_property() {
        let state = get_test_state();

        let result =
            create_property_endpoint(State(state.clone()), Extension(auth_user()), Json(payload()))
                .await;

        let response = result.expect("expected a created property").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["property"]["name"], "Park View Unit");
        assert_eq!(body["property"]["status"], "active");

        let connection = state.db_connection.lock().unwrap();
        let property = get_owned_property(1, UserId::new(1), &connection).unwrap();
        assert_eq!(property.property_type, PropertyType::Rent);
    }

    #[tokio::test]
    async fn create_rejects_an_unknown_type() {
        let state = get_test_state();
        let mut bad_type = payload();
        bad_type.property_type = "lease".to_owned();

        let result =
            create_property_endpoint(State(state), Extension(auth_user()), Json(bad_type)).await;

        let Err(Error::Validation(errors)) = result else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.get("type"), Some("The type must be sale or rent."));
    }

    #[tokio::test]
    async fn create_rejects_malformed_fields() {
        let state = get_test_state();
        let mut malformed = payload();
        malformed.name = "ab".to_owned();
        malformed.description = String::new();
        malformed.price = 0.0;

        let result =
            create_property_endpoint(State(state), Extension(auth_user()), Json(malformed)).await;

        let Err(Error::Validation(errors)) = result else {
            panic!("expected a validation error");
        };
        assert!(errors.get("name").is_some());
        assert!(errors.get("description").is_some());
        assert!(errors.get("price").is_some());
    }
}
