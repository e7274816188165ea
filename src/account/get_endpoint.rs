//! Defines the endpoint for fetching an account with its transactions.
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
    transaction::get_account_transactions,
};

/// The state needed to fetch an account.
#[derive(Clone)]
pub struct GetAccountState {
    /// The database connection for accounts and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for fetching an account along with its transactions.
///
/// # Errors
///
/// - [Error::MissingResource] (404) if no account has the given ID.
/// - [Error::NotResourceOwner] (401) if the account belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_account_endpoint(
    State(state): State<GetAccountState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let account = get_owned_account(account_id, auth_user.id, &connection)?;
    let transactions = get_account_transactions(account.id, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "account": account,
        "transactions": transactions,
    }))
    .into_response())
}

#[cfg(test)]
mod get_account_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{NewAccount, create_account, create_account_table},
        auth::AuthenticatedUser,
        balance_history::create_balance_history_table,
        transaction::{
            NewTransaction, TransactionType, create_transaction, create_transaction_table,
        },
        user::{Permission, UserId},
    };

    use super::{GetAccountState, get_account_endpoint};

    fn get_test_state() -> GetAccountState {
        let connection = Connection::open_in_memory().unwrap();
        create_account_table(&connection).unwrap();
        create_balance_history_table(&connection).unwrap();
        create_transaction_table(&connection).unwrap();

        let account = create_account(
            NewAccount {
                user_id: UserId::new(1),
                name: "Checking".to_owned(),
                description: None,
                number: None,
                provider: None,
                account_type: None,
                currency: "NZD".to_owned(),
                balance: 250.0,
            },
            &connection,
        )
        .unwrap();
        create_transaction(
            NewTransaction {
                user_id: UserId::new(1),
                account_id: Some(account.id),
                title: "Weekly groceries".to_owned(),
                description: None,
                amount: 42.0,
                cost: 0.0,
                transaction_type: TransactionType::Expense,
                currency: "NZD".to_owned(),
                category: None,
                date: date!(2025 - 06 - 01),
            },
            &connection,
        )
        .unwrap();

        GetAccountState {
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
    async fn get_returns_account_with_transactions() {
        let state = get_test_state();

        let result = get_account_endpoint(State(state), Extension(auth_user(1)), Path(1)).await;

        let response = result.expect("expected the account");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["account"]["name"], "Checking");
        let transactions = body["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["title"], "Weekly groceries");
    }

    #[tokio::test]
    async fn get_rejects_other_users_account() {
        let state = get_test_state();

        let result = get_account_endpoint(State(state), Extension(auth_user(2)), Path(1)).await;

        assert!(matches!(result, Err(Error::NotResourceOwner("account"))));
    }

    #[tokio::test]
    async fn get_fails_for_unknown_account() {
        let state = get_test_state();

        let result = get_account_endpoint(State(state), Extension(auth_user(1)), Path(7)).await;

        assert!(matches!(result, Err(Error::MissingResource("account"))));
    }
}
