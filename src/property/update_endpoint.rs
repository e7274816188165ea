//! Defines the endpoint for updating a property listing.
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
    database_id::DatabaseId,
    property::{
        PropertyStatus, PropertyType, PropertyUpdate, get_owned_property, update_property,
    },
    validation::{ValidationErrors, require_length, require_positive, require_present},
};

/// The state needed to update a property.
#[derive(Clone)]
pub struct UpdatePropertyState {
    /// The database connection for properties.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdatePropertyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for updating a property.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePropertyData {
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

/// A route handler for updating one of the caller's properties.
///
/// # Errors
///
/// - [Error::Validation] (400) if a field is malformed.
/// - [Error::MissingResource] (404) if no property has the given ID.
/// - [Error::NotResourceOwner] (401) if the property belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn update_property_endpoint(
    State(state): State<UpdatePropertyState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(property_id): Path<DatabaseId>,
    Json(payload): Json<UpdatePropertyData>,
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

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let property = get_owned_property(property_id, auth_user.id, &connection)?;
    update_property(
        property.id,
        &PropertyUpdate {
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
        &connection,
    )?;
    let property = get_owned_property(property.id, auth_user.id, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "property": property,
    }))
    .into_response())
}
