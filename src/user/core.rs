use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, user::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The feature tier of a user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// The free tier.
    #[default]
    Normal,
    /// The paid tier.
    Paid,
    /// Full access, including other users' data.
    Admin,
}

impl Permission {
    /// The string stored in the database for this permission.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Normal => "normal",
            Permission::Paid => "paid",
            Permission::Admin => "admin",
        }
    }

    /// Parse a permission from its database representation.
    ///
    /// Unknown strings map to [Permission::Normal] rather than failing, so a
    /// bad row cannot lock a user out.
    pub fn from_str_or_default(value: &str) -> Self {
        match value {
            "paid" => Permission::Paid,
            "admin" => Permission::Admin,
            _ => Permission::Normal,
        }
    }
}

/// A user of the application.
///
/// The caller should ensure that `id` is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The email address the user registered with. Unique.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// Whether the user has confirmed their email address with a one-time
    /// password.
    pub verified: bool,
    /// The user's feature tier.
    pub permission: Permission,
    /// The external identity provider the user signed up with, if any.
    pub provider: Option<String>,
    /// The currency to assume when a request does not specify one.
    pub default_currency: Option<String>,
    /// Whether the user has completed the onboarding flow.
    pub onboarded: bool,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// The fields needed to register a new user.
///
/// The remaining [User] fields start from their defaults: unverified, normal
/// permission, not onboarded.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The email address to register. Must not belong to another user.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// The public view of a user, safe to embed in JSON responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's ID.
    pub id: UserId,
    /// The user's given name.
    pub firstname: String,
    /// The user's family name.
    pub lastname: String,
    /// The user's email address.
    pub email: String,
    /// Whether the user has confirmed their email address.
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
    /// The user's feature tier.
    pub permission: Permission,
    /// The currency to assume when a request does not specify one.
    #[serde(rename = "defaultCurrency")]
    pub default_currency: Option<String>,
    /// Whether the user has completed the onboarding flow.
    #[serde(rename = "isOnboarded")]
    pub is_onboarded: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            firstname: user.first_name.clone(),
            lastname: user.last_name.clone(),
            email: user.email.clone(),
            is_verified: user.verified,
            permission: user.permission,
            default_currency: user.default_currency.clone(),
            is_onboarded: user.onboarded,
        }
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            verified INTEGER NOT NULL DEFAULT 0,
            permission TEXT NOT NULL DEFAULT 'normal',
            provider TEXT,
            default_currency TEXT,
            onboarded INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let id = UserId::new(row.get(0)?);
    let first_name = row.get(1)?;
    let last_name = row.get(2)?;
    let email = row.get(3)?;
    let raw_password_hash: String = row.get(4)?;
    let verified = row.get(5)?;
    let raw_permission: String = row.get(6)?;
    let provider = row.get(7)?;
    let default_currency = row.get(8)?;
    let onboarded = row.get(9)?;
    let created_at = row.get(10)?;

    Ok(User {
        id,
        first_name,
        last_name,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        verified,
        permission: Permission::from_str_or_default(&raw_permission),
        provider,
        default_currency,
        onboarded,
        created_at,
    })
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, password, verified, permission, \
     provider, default_currency, onboarded, created_at";

/// Create and insert a new user into the database.
///
/// The user starts unverified with the normal permission tier.
///
/// # Errors
///
/// Returns [Error::DuplicateEmail] if the email is already registered, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn insert_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (first_name, last_name, email, password, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &new_user.first_name,
            &new_user.last_name,
            &new_user.email,
            new_user.password_hash.to_string(),
            created_at,
        ),
    )?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        email: new_user.email,
        password_hash: new_user.password_hash,
        verified: false,
        permission: Permission::Normal,
        provider: None,
        default_currency: None,
        onboarded: false,
        created_at,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the database.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .query_one(
            &format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"),
            &[(":id", &user_id.as_i64())],
            map_row_to_user,
        )
        .map_err(|error| error.into())
}

/// Get the user from the database registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user is registered with `email`, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .query_one(
            &format!("SELECT {USER_COLUMNS} FROM user WHERE email = :email"),
            &[(":email", &email)],
            map_row_to_user,
        )
        .map_err(|error| error.into())
}

/// Mark the user as having confirmed their email address.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, or [Error::SqlError] if an SQL related error occurred.
pub fn mark_user_verified(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET verified = 1 WHERE id = ?1",
        (user_id.as_i64(),),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Replace the user's password hash.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, or [Error::SqlError] if an SQL related error occurred.
pub fn update_user_password(
    user_id: UserId,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.to_string(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// The profile fields a user may change after registration.
#[derive(Debug, Clone)]
pub struct UserProfileUpdate {
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The currency to assume when a request does not specify one.
    pub default_currency: Option<String>,
    /// Whether the user has completed the onboarding flow.
    pub onboarded: bool,
}

/// Overwrite the user's profile fields.
///
/// Email, password, and permission are deliberately not part of the profile:
/// they change through their own flows.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, or [Error::SqlError] if an SQL related error occurred.
pub fn update_user_profile(
    user_id: UserId,
    update: &UserProfileUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user
         SET first_name = ?1, last_name = ?2, default_currency = ?3, onboarded = ?4
         WHERE id = ?5",
        (
            &update.first_name,
            &update.last_name,
            &update.default_currency,
            update.onboarded,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
