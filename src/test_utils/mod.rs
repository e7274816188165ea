#![allow(missing_docs)]
//! Helpers for endpoint tests that run against the full router.

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, build_router, endpoints,
    email::Mailer,
    pagination::PaginationConfig,
    user::{NewUser, PasswordHash, User, ValidatedPassword, insert_user, mark_user_verified},
};

pub(crate) const TEST_JWT_SECRET: &str = "averysecretsecret";

/// Create an [AppState] backed by an in-memory database with the schema set up.
pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(
        connection,
        TEST_JWT_SECRET,
        Mailer::disabled(),
        PaginationConfig::default(),
    )
    .expect("Could not create app state")
}

/// Create a test server running the full application router.
pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// Insert a user that has already verified their email address.
///
/// Uses a low bcrypt cost so tests stay fast.
pub(crate) fn seed_verified_user(state: &AppState, email: &str, password: &str) -> User {
    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked(password), 4)
        .expect("Could not hash password");
    let user = insert_user(
        NewUser {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: email.to_owned(),
            password_hash,
        },
        &connection,
    )
    .expect("Could not insert user");
    mark_user_verified(user.id, &connection).expect("Could not verify user");

    user
}

/// Log in through the API and return the access token.
pub(crate) async fn log_in(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    body["accessToken"]
        .as_str()
        .expect("response is missing an access token")
        .to_owned()
}
