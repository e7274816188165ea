//! Defines the endpoint for updating a debt, including settling it.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    database_id::DatabaseId,
    debt::{DebtStatus, DebtType, DebtUpdate, get_owned_debt, update_debt},
    validation::{ValidationErrors, require_length, require_positive, require_present},
};

/// The state needed to update a debt.
#[derive(Clone)]
pub struct UpdateDebtState {
    /// The database connection for debts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateDebtState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request payload for updating a debt.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDebtData {
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
    /// Whether the debt is still outstanding. Defaults to open.
    pub status: Option<String>,
    /// Free-form notes.
    pub description: Option<String>,
}

/// A route handler for updating one of the caller's debts.
///
/// Settling a debt is an update that sets `status` to `settled`.
///
/// # Errors
///
/// - [Error::Validation] (400) if a field is malformed.
/// - [Error::MissingResource] (404) if no debt has the given ID.
/// - [Error::NotResourceOwner] (401) if the debt belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn update_debt_endpoint(
    State(state): State<UpdateDebtState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(debt_id): Path<DatabaseId>,
    Json(payload): Json<UpdateDebtData>,
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

    let status = payload
        .status
        .as_deref()
        .map(DebtStatus::from_str_or_default)
        .unwrap_or_default();

    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    let debt = get_owned_debt(debt_id, auth_user.id, &connection)?;
    update_debt(
        debt.id,
        &DebtUpdate {
            name: payload.name,
            debt_type,
            amount: payload.amount,
            currency: payload.currency,
            counterparty: payload.counterparty,
            due_date: payload.due_date,
            status,
            description: payload.description,
        },
        &connection,
    )?;
    let debt = get_owned_debt(debt.id, auth_user.id, &connection)?;

    Ok(Json(json!({
        "ok": true,
        "debt": debt,
    }))
    .into_response())
}
