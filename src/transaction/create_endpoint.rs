//! Defines the endpoint for recording a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountId, get_owned_account},
    auth::AuthenticatedUser,
    ledger,
    transaction::{NewTransaction, TransactionType, create_transaction},
    validation::{
        ValidationErrors, require_length, require_non_negative, require_positive, require_present,
    },
};

/// The state needed to record a transaction.
#[derive(Clone)]
pub struct CreateTransactionState {
    /// The database connection for transactions and accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for recording a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionData {
    /// The account to charge the transaction to.
    pub account: Option<AccountId>,
    /// A short label for the transaction.
    pub title: String,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The amount of money spent or earned. Must be positive.
    pub amount: f64,
    /// Extra money on top of `amount`, e.g. fees or delivery. Defaults to zero.
    pub cost: Option<f64>,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The ISO currency code for the transaction.
    pub currency: String,
    /// The category label.
    pub category: Option<String>,
    /// When the transaction happened.
    pub date: Date,
}

/// A route handler for recording a new transaction.
///
/// When the transaction is charged to an account, the account must belong to
/// the caller and share the transaction's currency, and its balance is
/// adjusted through the ledger once the row is written.
///
/// # Errors
///
/// - [Error::Validation] (400) if a field is malformed.
/// - [Error::MissingResource] (404) if the account does not exist.
/// - [Error::NotResourceOwner] (401) if the account belongs to another user.
/// - [Error::CurrencyMismatch] (400) if the account uses another currency.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateTransactionData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_length(&mut errors, "title", &payload.title, 3, 256);
    require_positive(&mut errors, "amount", payload.amount);
    if let Some(cost) = payload.cost {
        require_non_negative(&mut errors, "cost", cost);
    }
    require_present(&mut errors, "currency", &payload.currency);
    let Some(transaction_type) = TransactionType::parse(&payload.transaction_type) else {
        errors.add("type", "The type must be income or expense.");
        return Err(errors.into());
    };
    errors.into_result()?;

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    if let Some(account_id) = payload.account {
        let account = get_owned_account(account_id, auth_user.id, &connection)?;

        if account.currency != payload.currency {
            return Err(Error::CurrencyMismatch);
        }
    }

    let transaction = create_transaction(
        NewTransaction {
            user_id: auth_user.id,
            account_id: payload.account,
            title: payload.title,
            description: payload.description,
            amount: payload.amount,
            cost: payload.cost.unwrap_or(0.0),
            transaction_type,
            currency: payload.currency,
            category: payload.category,
            date: payload.date,
        },
        &connection,
    )?;
    ledger::reconcile_on_create(&transaction, &connection)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "transactionId": transaction.id,
        })),
    )
        .into_response())
}

#[cfg(test)]
mod create_transaction_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountId, NewAccount, create_account, create_account_table, get_owned_account},
        auth::AuthenticatedUser,
        balance_history::{create_balance_history_table, list_snapshots},
        transaction::create_transaction_table,
        user::{Permission, UserId},
    };

    use super::{CreateTransactionData, CreateTransactionState, create_transaction_endpoint};

    fn get_test_state() -> (CreateTransactionState, AccountId) {
        let connection = Connection::open_in_memory().unwrap();
        create_account_table(&connection).unwrap();
        create_balance_history_table(&connection).unwrap();
        create_transaction_table(&connection).unwrap();

        let account = create_account(
            NewAccount {
                user_id: UserId::new(1),
                name: "Everyday Checking".to_owned(),
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

        (
            CreateTransactionState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            account.id,
        )
    }

    fn auth_user(id: i64) -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(id),
            email: "ada@example.com".to_owned(),
            permission: Permission::Normal,
        }
    }

    fn payload(account: Option<AccountId>) -> CreateTransactionData {
        CreateTransactionData {
            account,
            title: "Weekly groceries".to_owned(),
            description: None,
            amount: 40.0,
            cost: None,
            transaction_type: "expense".to_owned(),
            currency: "NZD".to_owned(),
            category: Some("groceries".to_owned()),
            date: date!(2025 - 06 - 01),
        }
    }

    #[tokio::test]
    async fn create_charges_the_account_and_snapshots_the_balance() {
        let (state, account_id) = get_test_state();

        let result = create_transaction_endpoint(
            State(state.clone()),
            Extension(auth_user(1)),
            Json(payload(Some(account_id))),
        )
        .await;

        let response = result.expect("expected a created transaction").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let account = get_owned_account(account_id, UserId::new(1), &connection).unwrap();
        assert_eq!(account.balance, 60.0);

        let snapshots = list_snapshots(account_id, &connection).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].balance, 60.0);
    }

    #[tokio::test]
    async fn create_income_adds_to_the_balance() {
        let (state, account_id) = get_test_state();
        let mut income = payload(Some(account_id));
        income.transaction_type = "income".to_owned();
        income.amount = 25.0;

        create_transaction_endpoint(State(state.clone()), Extension(auth_user(1)), Json(income))
            .await
            .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let account = get_owned_account(account_id, UserId::new(1), &connection).unwrap();
        assert_eq!(account.balance, 125.0);
    }

    #[tokio::test]
    async fn create_without_account_leaves_balances_alone() {
        let (state, account_id) = get_test_state();

        let result =
            create_transaction_endpoint(State(state.clone()), Extension(auth_user(1)), Json(payload(None)))
                .await;

        assert!(result.is_ok());
        let connection = state.db_connection.lock().unwrap();
        let account = get_owned_account(account_id, UserId::new(1), &connection).unwrap();
        assert_eq!(account.balance, 100.0);
        assert_eq!(list_snapshots(account_id, &connection).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_clamps_an_overdraft_at_zero() {
        let (state, account_id) = get_test_state();
        let mut overdraft = payload(Some(account_id));
        overdraft.amount = 250.0;

        create_transaction_endpoint(State(state.clone()), Extension(auth_user(1)), Json(overdraft))
            .await
            .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let account = get_owned_account(account_id, UserId::new(1), &connection).unwrap();
        assert_eq!(account.balance, 0.0);
    }

    #[tokio::test]
    async fn create_rejects_a_currency_mismatch() {
        let (state, account_id) = get_test_state();
        let mut mismatched = payload(Some(account_id));
        mismatched.currency = "USD".to_owned();

        let result =
            create_transaction_endpoint(State(state.clone()), Extension(auth_user(1)), Json(mismatched))
                .await;

        assert!(matches!(result, Err(Error::CurrencyMismatch)));
        let connection = state.db_connection.lock().unwrap();
        let transaction_count: i64 = connection
            .query_one("SELECT COUNT(id) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(transaction_count, 0);
    }

    #[tokio::test]
    async fn create_rejects_another_users_account() {
        let (state, account_id) = get_test_state();

        let result = create_transaction_endpoint(
            State(state),
            Extension(auth_user(2)),
            Json(payload(Some(account_id))),
        )
        .await;

        assert!(matches!(result, Err(Error::NotResourceOwner("account"))));
    }

    #[tokio::test]
    async fn create_fails_for_an_unknown_account() {
        let (state, _) = get_test_state();

        let result =
            create_transaction_endpoint(State(state), Extension(auth_user(1)), Json(payload(Some(42))))
                .await;

        assert!(matches!(result, Err(Error::MissingResource("account"))));
    }

    #[tokio::test]
    async fn create_rejects_malformed_fields() {
        let (state, _) = get_test_state();
        let mut malformed = payload(None);
        malformed.title = "ab".to_owned();
        malformed.amount = 0.0;
        malformed.cost = Some(-1.0);
        malformed.currency = String::new();

        let result =
            create_transaction_endpoint(State(state), Extension(auth_user(1)), Json(malformed))
                .await;

        let Err(Error::Validation(errors)) = result else {
            panic!("expected a validation error");
        };
        assert!(errors.get("title").is_some());
        assert!(errors.get("amount").is_some());
        assert!(errors.get("cost").is_some());
        assert!(errors.get("currency").is_some());
    }

    #[tokio::test]
    async fn create_rejects_an_unknown_type() {
        let (state, _) = get_test_state();
        let mut bad_type = payload(None);
        bad_type.transaction_type = "transfer".to_owned();

        let result =
            create_transaction_endpoint(State(state), Extension(auth_user(1)), Json(bad_type)).await;

        let Err(Error::Validation(errors)) = result else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.get("type"), Some("The type must be income or expense."));
    }
}
