//! Defines the endpoint for listing a user's currencies.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    account::get_account_currencies,
    auth::AuthenticatedUser,
    user::get_user_by_id,
};

/// The state needed to list a user's currencies.
#[derive(Clone)]
pub struct UserCurrenciesState {
    /// The database connection for users and accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserCurrenciesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the currencies a user deals in.
///
/// Returns the distinct currencies across the user's accounts, with the
/// user's default currency included even when no account uses it yet.
///
/// # Errors
///
/// - [Error::NotResourceOwner] (401) if the path ID is not the caller's.
/// - [Error::MissingResource] (404) if the user row no longer exists.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_user_currencies_endpoint(
    State(state): State<UserCurrenciesState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
) -> Result<Response, Error> {
    if user_id != auth_user.id.as_i64() {
        return Err(Error::NotResourceOwner("user"));
    }

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let user = get_user_by_id(auth_user.id, &connection).map_err(|error| match error {
        Error::NotFound => Error::MissingResource("user"),
        other => other,
    })?;
    let mut currencies = get_account_currencies(auth_user.id, &connection)?;

    if let Some(default_currency) = &user.default_currency
        && !currencies.contains(default_currency)
    {
        currencies.push(default_currency.clone());
    }

    Ok(Json(json!({
        "ok": true,
        "defaultCurrency": user.default_currency,
        "currencies": currencies,
    }))
    .into_response())
}

#[cfg(test)]
mod user_currencies_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{NewAccount, create_account, create_account_table},
        auth::AuthenticatedUser,
        balance_history::create_balance_history_table,
        user::{
            NewUser, PasswordHash, Permission, UserProfileUpdate, create_user_table, insert_user,
            update_user_profile,
        },
    };

    use super::{UserCurrenciesState, get_user_currencies_endpoint};

    fn get_test_state() -> (UserCurrenciesState, AuthenticatedUser) {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();
        create_account_table(&connection).unwrap();
        create_balance_history_table(&connection).unwrap();

        let user = insert_user(
            NewUser {
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
                email: "ada@example.com".to_owned(),
                password_hash: PasswordHash::new_unchecked("hash"),
            },
            &connection,
        )
        .unwrap();
        update_user_profile(
            user.id,
            &UserProfileUpdate {
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                default_currency: Some("GBP".to_owned()),
                onboarded: false,
            },
            &connection,
        )
        .unwrap();

        for currency in ["NZD", "USD"] {
            create_account(
                NewAccount {
                    user_id: user.id,
                    name: format!("{currency} account"),
                    description: None,
                    number: None,
                    provider: None,
                    account_type: None,
                    currency: currency.to_owned(),
                    balance: 0.0,
                },
                &connection,
            )
            .unwrap();
        }

        let auth_user = AuthenticatedUser {
            id: user.id,
            email: user.email,
            permission: Permission::Normal,
        };

        (
            UserCurrenciesState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            auth_user,
        )
    }

    #[tokio::test]
    async fn currencies_include_accounts_and_default() {
        let (state, auth_user) = get_test_state();

        let result =
            get_user_currencies_endpoint(State(state), Extension(auth_user), Path(1)).await;

        let response = result.expect("expected a currency list");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["defaultCurrency"], "GBP");
        let currencies: Vec<&str> = body["currencies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|value| value.as_str().unwrap())
            .collect();
        assert_eq!(currencies, vec!["NZD", "USD", "GBP"]);
    }

    #[tokio::test]
    async fn currencies_reject_other_users() {
        let (state, auth_user) = get_test_state();

        let result =
            get_user_currencies_endpoint(State(state), Extension(auth_user), Path(99)).await;

        assert!(matches!(result, Err(Error::NotResourceOwner("user"))));
    }
}
