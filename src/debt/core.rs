use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, database_id::DatabaseId, user::UserId};

/// Which direction the money went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtType {
    /// Money the user lent to someone else.
    Lend,
    /// Money the user borrowed.
    Borrow,
}

impl DebtType {
    /// The string stored in the database for this debt type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtType::Lend => "lend",
            DebtType::Borrow => "borrow",
        }
    }

    /// Parse a debt type from its database or request representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lend" => Some(DebtType::Lend),
            "borrow" => Some(DebtType::Borrow),
            _ => None,
        }
    }
}

/// Whether a debt is still outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    /// The debt has not been repaid.
    #[default]
    Open,
    /// The debt has been repaid.
    Settled,
}

impl DebtStatus {
    /// The string stored in the database for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStatus::Open => "open",
            DebtStatus::Settled => "settled",
        }
    }

    /// Parse a status from its database representation.
    ///
    /// Unknown strings map to [DebtStatus::Open].
    pub fn from_str_or_default(value: &str) -> Self {
        match value {
            "settled" => DebtStatus::Settled,
            _ => DebtStatus::Open,
        }
    }
}

/// Money lent to or borrowed from someone outside the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    /// The id for the debt.
    pub id: DatabaseId,
    /// The id of the user tracking the debt.
    #[serde(rename = "user")]
    pub user_id: UserId,
    /// A short label for the debt.
    pub name: String,
    /// Whether the money was lent or borrowed.
    #[serde(rename = "type")]
    pub debt_type: DebtType,
    /// The outstanding amount.
    pub amount: f64,
    /// The ISO currency code for the amount.
    pub currency: String,
    /// Who the money was lent to or borrowed from.
    pub counterparty: Option<String>,
    /// When the debt is due.
    #[serde(rename = "dueDate")]
    pub due_date: Option<Date>,
    /// Whether the debt is still outstanding.
    pub status: DebtStatus,
    /// Free-form notes.
    pub description: Option<String>,
    /// When the debt was recorded.
    #[serde(rename = "createdAt")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to record a new debt.
#[derive(Debug, Clone)]
pub struct NewDebt {
    /// The id of the user tracking the debt.
    pub user_id: UserId,
    /// A short label for the debt.
    pub name: String,
    /// Whether the money was lent or borrowed.
    pub debt_type: DebtType,
    /// The outstanding amount.
    pub amount: f64,
    /// The ISO currency code for the amount.
    pub currency: String,
    /// Who the money was lent to or borrowed from.
    pub counterparty: Option<String>,
    /// When the debt is due.
    pub due_date: Option<Date>,
    /// Free-form notes.
    pub description: Option<String>,
}

/// The fields a debt update overwrites.
#[derive(Debug, Clone)]
pub struct DebtUpdate {
    /// A short label for the debt.
    pub name: String,
    /// Whether the money was lent or borrowed.
    pub debt_type: DebtType,
    /// The outstanding amount.
    pub amount: f64,
    /// The ISO currency code for the amount.
    pub currency: String,
    /// Who the money was lent to or borrowed from.
    pub counterparty: Option<String>,
    /// When the debt is due.
    pub due_date: Option<Date>,
    /// Whether the debt is still outstanding.
    pub status: DebtStatus,
    /// Free-form notes.
    pub description: Option<String>,
}

/// Create the debt table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_debt_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS debt (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            debt_type TEXT NOT NULL,
            amount REAL NOT NULL,
            currency TEXT NOT NULL,
            counterparty TEXT,
            due_date TEXT,
            status TEXT NOT NULL DEFAULT 'open',
            description TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_debt(row: &rusqlite::Row) -> Result<Debt, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let name = row.get(2)?;
    let raw_debt_type: String = row.get(3)?;
    let debt_type = DebtType::parse(&raw_debt_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown debt type: {raw_debt_type}").into(),
        )
    })?;
    let amount = row.get(4)?;
    let currency = row.get(5)?;
    let counterparty = row.get(6)?;
    let due_date = row.get(7)?;
    let raw_status: String = row.get(8)?;
    let description = row.get(9)?;
    let created_at = row.get(10)?;

    Ok(Debt {
        id,
        user_id,
        name,
        debt_type,
        amount,
        currency,
        counterparty,
        due_date,
        status: DebtStatus::from_str_or_default(&raw_status),
        description,
        created_at,
    })
}

const DEBT_COLUMNS: &str = "id, user_id, name, debt_type, amount, currency, counterparty, \
     due_date, status, description, created_at";

/// Create and insert a new debt into the database.
///
/// New debts always start open.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn create_debt(new_debt: NewDebt, connection: &Connection) -> Result<Debt, Error> {
    let created_at = OffsetDateTime::now_utc();

    let id = connection.query_one(
        "INSERT INTO debt
            (user_id, name, debt_type, amount, currency, counterparty, due_date, description,
             created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         RETURNING id",
        (
            new_debt.user_id.as_i64(),
            &new_debt.name,
            new_debt.debt_type.as_str(),
            new_debt.amount,
            &new_debt.currency,
            &new_debt.counterparty,
            new_debt.due_date,
            &new_debt.description,
            created_at,
        ),
        |row| row.get(0),
    )?;

    Ok(Debt {
        id,
        user_id: new_debt.user_id,
        name: new_debt.name,
        debt_type: new_debt.debt_type,
        amount: new_debt.amount,
        currency: new_debt.currency,
        counterparty: new_debt.counterparty,
        due_date: new_debt.due_date,
        status: DebtStatus::Open,
        description: new_debt.description,
        created_at,
    })
}

/// Get the debt with `debt_id`, checking that it belongs to `user_id`.
///
/// # Errors
///
/// Returns [Error::MissingResource] if no debt has `debt_id`,
/// [Error::NotResourceOwner] if it belongs to another user, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn get_owned_debt(
    debt_id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Debt, Error> {
    let debt = connection
        .query_one(
            &format!("SELECT {DEBT_COLUMNS} FROM debt WHERE id = :id"),
            &[(":id", &debt_id)],
            map_row_to_debt,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingResource("debt"),
            error => error.into(),
        })?;

    if debt.user_id != user_id {
        return Err(Error::NotResourceOwner("debt"));
    }

    Ok(debt)
}

/// Get the debts owned by `user_id`, newest first.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn list_debts(
    user_id: UserId,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Debt>, Error> {
    connection
        .prepare(&format!(
            "SELECT {DEBT_COLUMNS} FROM debt
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3"
        ))?
        .query_map((user_id.as_i64(), limit, offset), map_row_to_debt)?
        .map(|maybe_debt| maybe_debt.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of debts owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn count_debts(user_id: UserId, connection: &Connection) -> Result<u64, Error> {
    connection
        .query_one(
            "SELECT COUNT(id) FROM debt WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Overwrite the debt's fields.
///
/// # Errors
///
/// Returns [Error::MissingResource] if `debt_id` does not belong to a debt, or
/// [Error::SqlError] if an SQL related error occurred.
pub fn update_debt(
    debt_id: DatabaseId,
    update: &DebtUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE debt
         SET name = ?1, debt_type = ?2, amount = ?3, currency = ?4, counterparty = ?5,
             due_date = ?6, status = ?7, description = ?8
         WHERE id = ?9",
        (
            &update.name,
            update.debt_type.as_str(),
            update.amount,
            &update.currency,
            &update.counterparty,
            update.due_date,
            update.status.as_str(),
            &update.description,
            debt_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::MissingResource("debt"));
    }

    Ok(())
}

/// Delete the debt with `debt_id`.
///
/// # Errors
///
/// Returns [Error::MissingResource] if `debt_id` does not belong to a debt, or
/// [Error::SqlError] if an SQL related error occurred.
pub fn delete_debt(debt_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM debt WHERE id = ?1", (debt_id,))?;

    if rows_affected == 0 {
        return Err(Error::MissingResource("debt"));
    }

    Ok(())
}
