//! Defines the endpoint for deleting an account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde_json::json;

use crate::{
    AppState, Error,
    account::{AccountId, delete_account, get_owned_account},
    auth::AuthenticatedUser,
    balance_history,
    transaction::delete_account_transactions,
};

/// The state needed to delete an account.
#[derive(Clone)]
pub struct DeleteAccountState {
    /// The database connection for accounts, transactions, and snapshots.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an account.
///
/// The account's transactions and balance history go with it, all in one
/// database transaction: either everything is removed or nothing is.
///
/// # Errors
///
/// - [Error::MissingResource] (404) if no account has the given ID.
/// - [Error::NotResourceOwner] (401) if the account belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let account = get_owned_account(account_id, auth_user.id, &connection)?;

    let sql_transaction =
        SqlTransaction::new_unchecked(&connection, TransactionBehavior::Immediate)?;
    delete_account_transactions(account.id, &sql_transaction)?;
    balance_history::purge(account.id, &sql_transaction)?;
    delete_account(account.id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({"ok": true})).into_response())
}

#[cfg(test)]
mod delete_account_tests {
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
        balance_history::{create_balance_history_table, list_snapshots},
        transaction::{
            NewTransaction, TransactionType, create_transaction, create_transaction_table,
        },
        user::{Permission, UserId},
    };

    use super::{DeleteAccountState, delete_account_endpoint};

    fn get_test_state() -> DeleteAccountState {
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

        DeleteAccountState {
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
    async fn delete_removes_account_transactions_and_history() {
        let state = get_test_state();

        let result = delete_account_endpoint(State(state.clone()), Extension(auth_user(1)), Path(1))
            .await;

        assert!(result.is_ok());
        let connection = state.db_connection.lock().unwrap();
        let account_count: i64 = connection
            .query_one("SELECT COUNT(id) FROM account", [], |row| row.get(0))
            .unwrap();
        let transaction_count: i64 = connection
            .query_one("SELECT COUNT(id) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(account_count, 0);
        assert_eq!(transaction_count, 0);
        assert!(list_snapshots(1, &connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_rejects_other_users_account() {
        let state = get_test_state();

        let result =
            delete_account_endpoint(State(state.clone()), Extension(auth_user(2)), Path(1)).await;

        assert!(matches!(result, Err(Error::NotResourceOwner("account"))));
        let connection = state.db_connection.lock().unwrap();
        let account_count: i64 = connection
            .query_one("SELECT COUNT(id) FROM account", [], |row| row.get(0))
            .unwrap();
        assert_eq!(account_count, 1);
    }

    #[tokio::test]
    async fn delete_fails_for_unknown_account() {
        let state = get_test_state();

        let result = delete_account_endpoint(State(state), Extension(auth_user(1)), Path(9)).await;

        assert!(matches!(result, Err(Error::MissingResource("account"))));
    }
}
