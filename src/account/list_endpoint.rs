//! Defines the endpoint for listing a user's accounts.
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
    account::list_accounts,
    auth::AuthenticatedUser,
    pagination::{Page, PaginationConfig, PaginationParams},
};

/// The state needed to list accounts.
#[derive(Clone)]
pub struct ListAccountsState {
    /// The config for paginating lists of data.
    pub pagination_config: PaginationConfig,
    /// The database connection for accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListAccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the caller's accounts, newest first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn list_accounts_endpoint(
    State(state): State<ListAccountsState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, Error> {
    let page = Page::resolve(params, &state.pagination_config);

    let accounts = list_accounts(
        auth_user.id,
        page.size,
        page.offset(),
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )?;

    Ok(Json(json!({
        "ok": true,
        "accounts": accounts,
    }))
    .into_response())
}

#[cfg(test)]
mod list_accounts_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
    };
    use rusqlite::Connection;

    use crate::{
        account::{NewAccount, create_account, create_account_table},
        auth::AuthenticatedUser,
        balance_history::create_balance_history_table,
        pagination::{PaginationConfig, PaginationParams},
        user::{Permission, UserId},
    };

    use super::{ListAccountsState, list_accounts_endpoint};

    fn get_test_state(account_count: usize) -> ListAccountsState {
        let connection = Connection::open_in_memory().unwrap();
        create_account_table(&connection).unwrap();
        create_balance_history_table(&connection).unwrap();

        for number in 1..=account_count {
            create_account(
                NewAccount {
                    user_id: UserId::new(1),
                    name: format!("Account {number}"),
                    description: None,
                    number: None,
                    provider: None,
                    account_type: None,
                    currency: "NZD".to_owned(),
                    balance: 0.0,
                },
                &connection,
            )
            .unwrap();
        }

        ListAccountsState {
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

    async fn request_page(state: ListAccountsState, params: PaginationParams) -> Vec<String> {
        let result = list_accounts_endpoint(State(state), Extension(auth_user()), Query(params))
            .await;

        let response = result.expect("expected an account list");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();

        body["accounts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|account| account["name"].as_str().unwrap().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn list_defaults_to_first_page_of_ten() {
        let state = get_test_state(12);

        let names = request_page(state, PaginationParams::default()).await;

        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "Account 12");
    }

    #[tokio::test]
    async fn list_respects_page_and_limit() {
        let state = get_test_state(5);

        let names = request_page(
            state,
            PaginationParams {
                page: Some(2),
                limit: Some(2),
            },
        )
        .await;

        assert_eq!(names, vec!["Account 3", "Account 2"]);
    }
}
