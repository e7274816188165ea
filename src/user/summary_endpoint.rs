//! Defines the endpoint for a user's dashboard summary.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;
use time::{Month, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    transaction::{get_monthly_totals, get_recent_transactions},
};

/// How many transactions the summary includes.
const RECENT_TRANSACTION_COUNT: u64 = 3;

/// The state needed to build a user's summary.
#[derive(Clone)]
pub struct SummaryState {
    /// The database connection for transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for a user's dashboard summary.
///
/// Returns the user's three most recent transactions and their income and
/// expense totals per month of the current year.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Response, Error> {
    let current_year = OffsetDateTime::now_utc().year();

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let recent_transactions =
        get_recent_transactions(auth_user.id, RECENT_TRANSACTION_COUNT, &connection)?;
    let monthly_totals = get_monthly_totals(auth_user.id, current_year, &connection)?;

    let spending_data: Vec<serde_json::Value> = monthly_totals
        .into_iter()
        .map(|totals| {
            // The query derives the month number from stored dates, so it is
            // always in 1..=12.
            let month = Month::try_from(totals.month).expect("invalid month number");

            json!({
                "month": month.to_string(),
                "income": totals.income,
                "expense": totals.expense,
            })
        })
        .collect();

    Ok(Json(json!({
        "ok": true,
        "summary": {
            "recentTransactions": recent_transactions,
            "spendingData": spending_data,
        },
    }))
    .into_response())
}

#[cfg(test)]
mod summary_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rusqlite::Connection;
    use time::{Date, Month, OffsetDateTime};

    use crate::{
        auth::AuthenticatedUser,
        transaction::{NewTransaction, TransactionType, create_transaction, create_transaction_table},
        user::{NewUser, PasswordHash, Permission, UserId, create_user_table, insert_user},
    };

    use super::{SummaryState, get_summary_endpoint};

    fn seed_transaction(
        connection: &Connection,
        user_id: UserId,
        title: &str,
        amount: f64,
        transaction_type: TransactionType,
        date: Date,
    ) {
        create_transaction(
            NewTransaction {
                user_id,
                account_id: None,
                title: title.to_owned(),
                description: None,
                amount,
                cost: 0.0,
                transaction_type,
                currency: "NZD".to_owned(),
                category: None,
                date,
            },
            connection,
        )
        .unwrap();
    }

    fn get_test_state() -> (SummaryState, AuthenticatedUser) {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();
        create_transaction_table(&connection).unwrap();

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

        let current_year = OffsetDateTime::now_utc().year();
        let january = Date::from_calendar_date(current_year, Month::January, 5).unwrap();
        let february = Date::from_calendar_date(current_year, Month::February, 5).unwrap();
        seed_transaction(
            &connection,
            user.id,
            "salary",
            1000.0,
            TransactionType::Income,
            january,
        );
        seed_transaction(
            &connection,
            user.id,
            "groceries",
            100.0,
            TransactionType::Expense,
            january,
        );
        seed_transaction(
            &connection,
            user.id,
            "rent",
            400.0,
            TransactionType::Expense,
            february,
        );
        seed_transaction(
            &connection,
            user.id,
            "power",
            80.0,
            TransactionType::Expense,
            february,
        );

        let auth_user = AuthenticatedUser {
            id: user.id,
            email: user.email,
            permission: Permission::Normal,
        };

        (
            SummaryState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            auth_user,
        )
    }

    #[tokio::test]
    async fn summary_reports_recent_transactions_and_monthly_spending() {
        let (state, auth_user) = get_test_state();

        let result = get_summary_endpoint(State(state), Extension(auth_user)).await;

        let response = result.expect("expected a summary");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], true);

        let recent = body["summary"]["recentTransactions"].as_array().unwrap();
        assert_eq!(recent.len(), 3);

        let spending = body["summary"]["spendingData"].as_array().unwrap();
        assert_eq!(spending.len(), 2);
        assert_eq!(spending[0]["month"], "January");
        assert_eq!(spending[0]["income"], 1000.0);
        assert_eq!(spending[0]["expense"], 100.0);
        assert_eq!(spending[1]["month"], "February");
        assert_eq!(spending[1]["expense"], 480.0);
    }

    #[tokio::test]
    async fn summary_is_empty_for_a_fresh_user() {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();
        create_transaction_table(&connection).unwrap();
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
        let state = SummaryState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let auth_user = AuthenticatedUser {
            id: user.id,
            email: user.email,
            permission: Permission::Normal,
        };

        let result = get_summary_endpoint(State(state), Extension(auth_user)).await;

        let response = result.expect("expected a summary");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(
            body["summary"]["recentTransactions"]
                .as_array()
                .unwrap()
                .is_empty()
        );
        assert!(body["summary"]["spendingData"].as_array().unwrap().is_empty());
    }
}
