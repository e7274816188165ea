//! Defines the endpoint for recording a debt.
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
    auth::AuthenticatedUser,
    debt::{DebtType, NewDebt, create_debt},
    validation::{ValidationErrors, require_length, require_positive, require_present},
};

/// The state needed to record a debt.
#[derive(Clone)]
pub struct CreateDebtState {
    /// The database connection for debts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateDebtState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for recording a debt.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDebtData {
    /// A short label for the debt.
    pub name: String,
    /// Whether the money was lent or borrowed.
    #[serde(rename = "type")]
    pub debt_type: String,
    /// The outstanding amount. Must be positive.
    pub amount: f64,
    /// The ISO currency code for the amount.
    pub currency: String,
    /// Who the money was lent to or borrowed from.
    pub counterparty: Option<String>,
    /// When the debt is due.
    #[serde(rename = "dueDate")]
    pub due_date: Option<Date>,
    /// Free-form notes.
    pub description: Option<String>,
}

/// A route handler for recording a new debt. New debts always start open.
///
/// # Errors
///
/// Returns [Error::Validation] (400) if a field is malformed.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_debt_endpoint(
    State(state): State<CreateDebtState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateDebtData>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::new();
    require_length(&mut errors, "name", &payload.name, 3, 256);
    require_positive(&mut errors, "amount", payload.amount);
    require_present(&mut errors, "currency", &payload.currency);
    let Some(debt_type) = DebtType::parse(&payload.debt_type) else {
        errors.add("type", "The type must be lend or borrow.");
        return Err(errors.into());
    };
    errors.into_result()?;

    let debt = create_debt(
        NewDebt {
            user_id: auth_user.id,
            name: payload.name,
            debt_type,
            amount: payload.amount,
            currency: payload.currency,
            counterparty: payload.counterparty,
            due_date: payload.due_date,
            description: payload.description,
        },
        &state
            .db_connection
            .lock()
            .expect("could not acquire database lock"),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "debt": debt,
        })),
    )
        .into_response())
}

#[cfg(test)]
mod create_debt_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::AuthenticatedUser,
        debt::{DebtStatus, DebtType, create_debt_table, get_owned_debt},
        user::{Permission, UserId},
    };

    use super::{CreateDebtData, CreateDebtState, create_debt_endpoint};

    fn get_test_state() -> CreateDebtState {
        let connection = Connection::open_in_memory().unwrap();
        create_debt_table(&connection).unwrap();

        CreateDebtState {
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

    fn payload() -> CreateDebtData {
        CreateDebtData {
            name: "Lunch money".to_owned(),
            debt_type: "lend".to_owned(),
            amount: 20.0,
            currency: "NZD".to_owned(),
            counterparty: Some("Sam".to_owned()),
            due_date: Some(date!(2025 - 12 - 01)),
            description: None,
        }
    }

    #[tokio::test]
    async fn create_stores_an_open_debt() {
        let state = get_test_state();

        let result =
            create_debt_endpoint(State(state.clone()), Extension(auth_user()), Json(payload()))
                .await;

        let response = result.expect("expected a created debt").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["debt"]["name"], "Lunch money");
        assert_eq!(body["debt"]["status"], "open");

        let connection = state.db_connection.lock().unwrap();
        let debt = get_owned_debt(1, UserId::new(1), &connection).unwrap();
        assert_eq!(debt.debt_type, DebtType::Lend);
        assert_eq!(debt.status, DebtStatus::Open);
    }

    #[tokio::test]
    async fn create_rejects_an_unknown_type() {
        let state = get_test_state();
        let mut bad_type = payload();
        bad_type.debt_type = "gift".to_owned();

        let result = create_debt_endpoint(State(state), Extension(auth_user()), Json(bad_type)).await;

        let Err(Error::Validation(errors)) = result else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.get("type"), Some("The type must be lend or borrow."));
    }

    #[tokio::test]
    async fn create_rejects_malformed_fields() {
        let state = get_test_state();
        let mut malformed = payload();
        malformed.name = "ab".to_owned();
        malformed.amount = -5.0;
        malformed.currency = String::new();

        let result = create_debt_endpoint(State(state), Extension(auth_user()), Json(malformed)).await;

        let Err(Error::Validation(errors)) = result else {
            panic!("expected a validation error");
        };
        assert!(errors.get("name").is_some());
        assert!(errors.get("amount").is_some());
        assert!(errors.get("currency").is_some());
    }
}
