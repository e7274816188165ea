//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;
use time::Duration;

use crate::{
    Error, auth::DEFAULT_TOKEN_DURATION, db::initialize, email::Mailer,
    pagination::PaginationConfig,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The key used to sign access tokens.
    pub jwt_encoding_key: EncodingKey,
    /// The key used to verify access token signatures.
    pub jwt_decoding_key: DecodingKey,
    /// How long an access token stays valid after signing.
    pub token_duration: Duration,
    /// The transport used to send account emails.
    pub mailer: Mailer,
    /// The config for paginating lists of data.
    pub pagination_config: PaginationConfig,
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create the application state, initializing the database schema if needed.
    ///
    /// `jwt_secret` is the secret string used to sign and verify access tokens.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if the database schema could not be created.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        mailer: Mailer,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            jwt_encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            jwt_decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_duration: DEFAULT_TOKEN_DURATION,
            mailer,
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
