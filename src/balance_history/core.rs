use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, account::AccountId, database_id::DatabaseId};

/// A snapshot of an account's balance at a point in time.
///
/// Snapshots are append-only: one row is written when an account is created
/// and another every time the ledger moves its balance. Rows are only ever
/// removed when the owning account is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// The id for the snapshot.
    pub id: DatabaseId,
    /// The account the snapshot belongs to.
    #[serde(rename = "account")]
    pub account_id: AccountId,
    /// The account balance at `created_at`.
    pub balance: f64,
    /// When the snapshot was taken.
    #[serde(rename = "createdAt")]
    pub created_at: OffsetDateTime,
}

/// Create the balance history table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_balance_history_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS balance_history (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            balance REAL NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_balance_snapshot(
    row: &rusqlite::Row,
) -> Result<BalanceSnapshot, rusqlite::Error> {
    let id = row.get(0)?;
    let account_id = row.get(1)?;
    let balance = row.get(2)?;
    let created_at = row.get(3)?;

    Ok(BalanceSnapshot {
        id,
        account_id,
        balance,
        created_at,
    })
}

/// Append a balance snapshot for `account_id`.
///
/// # Errors
/// Returns [Error::SqlError] if the insert failed.
pub fn record(account_id: AccountId, balance: f64, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO balance_history (account_id, balance, created_at) VALUES (?1, ?2, ?3)",
        (account_id, balance, OffsetDateTime::now_utc()),
    )?;

    Ok(())
}

/// Get the snapshots for `account_id`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query failed.
pub fn list_snapshots(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<BalanceSnapshot>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, balance, created_at FROM balance_history
             WHERE account_id = :account_id
             ORDER BY id DESC",
        )?
        .query_map(&[(":account_id", &account_id)], map_row_to_balance_snapshot)?
        .map(|maybe_snapshot| maybe_snapshot.map_err(|error| error.into()))
        .collect()
}

/// Delete every snapshot for `account_id`.
///
/// Only called as part of deleting the account itself.
///
/// # Errors
/// Returns [Error::SqlError] if the delete failed.
pub fn purge(account_id: AccountId, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM balance_history WHERE account_id = ?1",
        (account_id,),
    )?;

    Ok(())
}
