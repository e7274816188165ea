//! Defines the endpoint for deleting a debt.
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
    auth::AuthenticatedUser,
    database_id::DatabaseId,
    debt::{delete_debt, get_owned_debt},
};

/// The state needed to delete a debt.
#[derive(Clone)]
pub struct DeleteDebtState {
    /// The database connection for debts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteDebtState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the caller's debts.
///
/// # Errors
///
/// - [Error::MissingResource] (404) if no debt has the given ID.
/// - [Error::NotResourceOwner] (401) if the debt belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_debt_endpoint(
    State(state): State<DeleteDebtState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(debt_id): Path<DatabaseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let debt = get_owned_debt(debt_id, auth_user.id, &connection)?;
    delete_debt(debt.id, &connection)?;

    Ok(Json(json!({ "ok": true })).into_response())
}

#[cfg(test)]
mod delete_debt_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::AuthenticatedUser,
        debt::{DebtType, NewDebt, create_debt, create_debt_table, get_owned_debt},
        user::{Permission, UserId},
    };

    use super::{DeleteDebtState, delete_debt_endpoint};

    fn get_test_state() -> DeleteDebtState {
        let connection = Connection::open_in_memory().unwrap();
        create_debt_table(&connection).unwrap();

        create_debt(
            NewDebt {
                user_id: UserId::new(1),
                name: "Lunch money".to_owned(),
                debt_type: DebtType::Lend,
                amount: 25.0,
                currency: "NZD".to_owned(),
                counterparty: None,
                due_date: None,
                description: None,
            },
            &connection,
        )
        .unwrap();

        DeleteDebtState {
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
    async fn delete_removes_the_debt() {
        let state = get_test_state();

        let result =
            delete_debt_endpoint(State(state.clone()), Extension(auth_user(1)), Path(1)).await;

        let response = result.expect("expected a deletion");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], true);

        let connection = state.db_connection.lock().unwrap();
        let result = get_owned_debt(1, UserId::new(1), &connection);
        assert_eq!(result, Err(Error::MissingResource("debt")));
    }

    #[tokio::test]
    async fn delete_rejects_another_users_debt() {
        let state = get_test_state();

        let result = delete_debt_endpoint(State(state), Extension(auth_user(2)), Path(1)).await;

        assert!(matches!(result, Err(Error::NotResourceOwner("debt"))));
    }

    #[tokio::test]
    async fn delete_fails_for_an_unknown_debt() {
        let state = get_test_state();

        let result = delete_debt_endpoint(State(state), Extension(auth_user(1)), Path(42)).await;

        assert!(matches!(result, Err(Error::MissingResource("debt"))));
    }
}
