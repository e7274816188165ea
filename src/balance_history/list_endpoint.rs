//! Defines the endpoint for listing an account's balance history.
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
    account::{AccountId, get_owned_account},
    auth::AuthenticatedUser,
    balance_history::list_snapshots,
};

/// The state needed to list an account's balance history.
#[derive(Clone)]
pub struct BalanceHistoryState {
    /// The database connection for accounts and their snapshots.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BalanceHistoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing an account's balance snapshots, newest first.
///
/// # Errors
///
/// - [Error::MissingResource] (404) if no account has the given ID.
/// - [Error::NotResourceOwner] (401) if the account belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_balance_history_endpoint(
    State(state): State<BalanceHistoryState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let account = get_owned_account(account_id, auth_user.id, &connection)?;
    let history = list_snapshots(account.id, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "balanceHistory": history,
    }))
    .into_response())
}

#[cfg(test)]
mod balance_history_endpoint_tests {
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
        balance_history::{create_balance_history_table, record},
        user::{Permission, UserId},
    };

    use super::{BalanceHistoryState, get_balance_history_endpoint};

    fn get_test_state() -> BalanceHistoryState {
        let connection = Connection::open_in_memory().unwrap();
        create_account_table(&connection).unwrap();
        create_balance_history_table(&connection).unwrap();

        let account = create_account(
            NewAccount {
                user_id: UserId::new(1),
                name: "Checking".to_owned(),
                description: None,
                number: None,
                provider: None,
                account_type: None,
                currency: "NZD".to_owned(),
                balance: 100.0,
            },
            &connection,
        )
        .unwrap();
        record(account.id, 150.0, &connection).unwrap();

        BalanceHistoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn auth_user(id: i64) -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(id),
            email: "ada@example.com".to_owned(),
            permission: Permission::Normal,
        }
    }

    #[tokio::test]
    async fn history_lists_snapshots_newest_first() {
        let state = get_test_state();

        let result =
            get_balance_history_endpoint(State(state), Extension(auth_user(1)), Path(1)).await;

        let response = result.expect("expected the snapshot list");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], true);
        let history = body["balanceHistory"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["balance"], 150.0);
        assert_eq!(history[1]["balance"], 100.0);
    }

    #[tokio::test]
    async fn history_rejects_other_users_account() {
        let state = get_test_state();

        let result =
            get_balance_history_endpoint(State(state), Extension(auth_user(2)), Path(1)).await;

        assert!(matches!(result, Err(Error::NotResourceOwner("account"))));
    }

    #[tokio::test]
    async fn history_fails_for_unknown_account() {
        let state = get_test_state();

        let result =
            get_balance_history_endpoint(State(state), Extension(auth_user(1)), Path(99)).await;

        assert!(matches!(result, Err(Error::MissingResource("account"))));
    }
}
