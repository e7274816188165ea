use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::DatabaseId, user::UserId};

/// Whether a property is listed for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// The property is for sale.
    Sale,
    /// The property is for rent.
    Rent,
}

impl PropertyType {
    /// The string stored in the database for this property type.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Sale => "sale",
            PropertyType::Rent => "rent",
        }
    }

    /// Parse a property type from its database or request representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sale" => Some(PropertyType::Sale),
            "rent" => Some(PropertyType::Rent),
            _ => None,
        }
    }
}

/// Whether a property listing is still available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    /// The listing is available.
    #[default]
    Active,
    /// The property has been sold or rented out.
    Taken,
}

impl PropertyStatus {
    /// The string stored in the database for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Active => "active",
            PropertyStatus::Taken => "taken",
        }
    }

    /// Parse a status from its database representation.
    ///
    /// Unknown strings map to [PropertyStatus::Active].
    pub fn from_str_or_default(value: &str) -> Self {
        match value {
            "taken" => PropertyStatus::Taken,
            _ => PropertyStatus::Active,
        }
    }
}

/// A real-estate listing tracked by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// The id for the property.
    pub id: DatabaseId,
    /// The id of the user who owns the listing.
    #[serde(rename = "user")]
    pub user_id: UserId,
    /// The display name of the property.
    pub name: String,
    /// A description of the property.
    pub description: String,
    /// Whether the property is for sale or rent.
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// The asking price, or rent per period.
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
    /// Whether the listing is still available.
    pub status: PropertyStatus,
    /// When the listing was created.
    #[serde(rename = "createdAt")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to create a new property listing.
#[derive(Debug, Clone)]
pub struct NewProperty {
    /// The id of the user who will own the listing.
    pub user_id: UserId,
    /// The display name of the property.
    pub name: String,
    /// A description of the property.
    pub description: String,
    /// Whether the property is for sale or rent.
    pub property_type: PropertyType,
    /// The asking price, or rent per period.
    pub price: f64,
    /// The ISO currency code for the price.
    pub currency: Option<String>,
    /// The number of rooms.
    pub room_count: Option<i64>,
    /// The number of bedrooms.
    pub bed_count: Option<i64>,
    /// The floor area in square meters.
    pub area: Option<f64>,
    /// Whether the listing is still available.
    pub status: PropertyStatus,
}

/// The fields a property update overwrites.
#[derive(Debug, Clone)]
pub struct PropertyUpdate {
    /// The display name of the property.
    pub name: String,
    /// A description of the property.
    pub description: String,
    /// Whether the property is for sale or rent.
    pub property_type: PropertyType,
    /// The asking price, or rent per period.
    pub price: f64,
    /// The ISO currency code for the price.
    pub currency: Option<String>,
    /// The number of rooms.
    pub room_count: Option<i64>,
    /// The number of bedrooms.
    pub bed_count: Option<i64>,
    /// The floor area in square meters.
    pub area: Option<f64>,
    /// Whether the listing is still available.
    pub status: PropertyStatus,
}

/// Create the property table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_property_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS property (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            property_type TEXT NOT NULL,
            price REAL NOT NULL,
            currency TEXT,
            room_count INTEGER,
            bed_count INTEGER,
            area REAL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_property(row: &rusqlite::Row) -> Result<Property, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let name = row.get(2)?;
    let description = row.get(3)?;
    let raw_property_type: String = row.get(4)?;
    let property_type = PropertyType::parse(&raw_property_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown property type: {raw_property_type}").into(),
        )
    })?;
    let price = row.get(5)?;
    let currency = row.get(6)?;
    let room_count = row.get(7)?;
    let bed_count = row.get(8)?;
    let area = row.get(9)?;
    let raw_status: String = row.get(10)?;
    let created_at = row.get(11)?;

    Ok(Property {
        id,
        user_id,
        name,
        description,
        property_type,
        price,
        currency,
        room_count,
        bed_count,
        area,
        status: PropertyStatus::from_str_or_default(&raw_status),
        created_at,
    })
}

const PROPERTY_COLUMNS: &str = "id, user_id, name, description, property_type, price, currency, \
     room_count, bed_count, area, status, created_at";

/// Create and insert a new property listing into the database.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn create_property(
    new_property: NewProperty,
    connection: &Connection,
) -> Result<Property, Error> {
    let created_at = OffsetDateTime::now_utc();

    let id = connection.query_one(
        "INSERT INTO property
            (user_id, name, description, property_type, price, currency, room_count, bed_count,
             area, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         RETURNING id",
        (
            new_property.user_id.as_i64(),
            &new_property.name,
            &new_property.description,
            new_property.property_type.as_str(),
            new_property.price,
            &new_property.currency,
            new_property.room_count,
            new_property.bed_count,
            new_property.area,
            new_property.status.as_str(),
            created_at,
        ),
        |row| row.get(0),
    )?;

    Ok(Property {
        id,
        user_id: new_property.user_id,
        name: new_property.name,
        description: new_property.description,
        property_type: new_property.property_type,
        price: new_property.price,
        currency: new_property.currency,
        room_count: new_property.room_count,
        bed_count: new_property.bed_count,
        area: new_property.area,
        status: new_property.status,
        created_at,
    })
}

/// Get the property with `property_id`, checking that it belongs to `user_id`.
///
/// # Errors
///
/// Returns [Error::MissingResource] if no property has `property_id`,
/// [Error::NotResourceOwner] if it belongs to another user, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn get_owned_property(
    property_id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Property, Error> {
    let property = connection
        .query_one(
            &format!("SELECT {PROPERTY_COLUMNS} FROM property WHERE id = :id"),
            &[(":id", &property_id)],
            map_row_to_property,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingResource("property"),
            error => error.into(),
        })?;

    if property.user_id != user_id {
        return Err(Error::NotResourceOwner("property"));
    }

    Ok(property)
}

/// Get the properties owned by `user_id`, newest first.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn list_properties(
    user_id: UserId,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Property>, Error> {
    connection
        .prepare(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM property
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3"
        ))?
        .query_map((user_id.as_i64(), limit, offset), map_row_to_property)?
        .map(|maybe_property| maybe_property.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of properties owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn count_properties(user_id: UserId, connection: &Connection) -> Result<u64, Error> {
    connection
        .query_one(
            "SELECT COUNT(id) FROM property WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Overwrite the property's fields.
///
/// # Errors
///
/// Returns [Error::MissingResource] if `property_id` does not belong to a
/// property, or [Error::SqlError] if an SQL related error occurred.
pub fn update_property(
    property_id: DatabaseId,
    update: &PropertyUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE property
         SET name = ?1, description = ?2, property_type = ?3, price = ?4, currency = ?5,
             room_count = ?6, bed_count = ?7, area = ?8, status = ?9
         WHERE id = ?10",
        (
            &update.name,
            &update.description,
            update.property_type.as_str(),
            update.price,
            &update.currency,
            update.room_count,
            update.bed_count,
            update.area,
            update.status.as_str(),
            property_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::MissingResource("property"));
    }

    Ok(())
}

/// Delete the property with `property_id`.
///
/// # Errors
///
/// Returns [Error::MissingResource] if `property_id` does not belong to a
/// property, or [Error::SqlError] if an SQL related error occurred.
pub fn delete_property(property_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM property WHERE id = ?1", (property_id,))?;

    if rows_affected == 0 {
        return Err(Error::MissingResource("property"));
    }

    Ok(())
}
