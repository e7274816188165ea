//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, ToSql};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::AccountId,
    database_id::TransactionId,
    user::UserId,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction adds money to an account or removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned: salary, interest, a repaid loan.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The string stored in the database for this transaction type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Parse a transaction type from its database or request representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }

    /// The direction the transaction moves an account balance: `+1.0` for
    /// income, `-1.0` for expense.
    pub fn sign(&self) -> f64 {
        match self {
            TransactionType::Income => 1.0,
            TransactionType::Expense => -1.0,
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for TransactionType {
    fn column_result(
        value: rusqlite::types::ValueRef<'_>,
    ) -> rusqlite::types::FromSqlResult<Self> {
        let text = value.as_str()?;

        TransactionType::parse(text).ok_or_else(|| {
            rusqlite::types::FromSqlError::Other(
                format!("unknown transaction type: {text}").into(),
            )
        })
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The id of the transaction.
    pub id: TransactionId,
    /// The id of the user the transaction belongs to.
    #[serde(rename = "user")]
    pub user_id: UserId,
    /// The account the transaction is charged to, if any.
    #[serde(rename = "account")]
    pub account_id: Option<AccountId>,
    /// A short label for the transaction.
    pub title: String,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The amount of money spent or earned. Always positive; direction comes
    /// from `transaction_type`.
    pub amount: f64,
    /// Extra money on top of `amount`, e.g. fees or delivery.
    pub cost: f64,
    /// `amount + cost`, computed when the transaction is written.
    #[serde(rename = "grandTotal")]
    pub grand_total: f64,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The ISO currency code for the transaction.
    pub currency: String,
    /// The category label, e.g. "groceries".
    pub category: Option<String>,
    /// When the transaction happened.
    pub date: Date,
    /// When the transaction was recorded.
    #[serde(rename = "createdAt")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to record a new transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// The id of the user the transaction belongs to.
    pub user_id: UserId,
    /// The account the transaction is charged to, if any.
    pub account_id: Option<AccountId>,
    /// A short label for the transaction.
    pub title: String,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The amount of money spent or earned. Always positive.
    pub amount: f64,
    /// Extra money on top of `amount`.
    pub cost: f64,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// The ISO currency code for the transaction.
    pub currency: String,
    /// The category label.
    pub category: Option<String>,
    /// When the transaction happened.
    pub date: Date,
}

/// The fields a transaction update overwrites.
///
/// The grand total is recomputed from `amount + cost` when the update is
/// written.
#[derive(Debug, Clone)]
pub struct TransactionUpdate {
    /// The account the transaction is charged to, if any.
    pub account_id: Option<AccountId>,
    /// A short label for the transaction.
    pub title: String,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The amount of money spent or earned. Always positive.
    pub amount: f64,
    /// Extra money on top of `amount`.
    pub cost: f64,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// The ISO currency code for the transaction.
    pub currency: String,
    /// The category label.
    pub category: Option<String>,
    /// When the transaction happened.
    pub date: Date,
}

/// Optional restrictions on which of a user's transactions a query touches.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only transactions charged to this account.
    pub account_id: Option<AccountId>,
    /// Only income or only expense transactions.
    pub transaction_type: Option<TransactionType>,
    /// Only transactions with this category label.
    pub category: Option<String>,
    /// Only transactions in this currency.
    pub currency: Option<String>,
}

/// Income and expense grand totals over a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransactionTotals {
    /// The sum of income grand totals.
    pub income: f64,
    /// The sum of expense grand totals.
    pub expense: f64,
}

/// Income and expense grand totals for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyTotals {
    /// The month number, 1 through 12.
    pub month: u8,
    /// The sum of income grand totals in the month.
    pub income: f64,
    /// The sum of expense grand totals in the month.
    pub expense: f64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// The table name is quoted everywhere because `transaction` is an SQL
/// keyword.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                account_id INTEGER,
                title TEXT NOT NULL,
                description TEXT,
                amount REAL NOT NULL,
                cost REAL NOT NULL DEFAULT 0,
                grand_total REAL NOT NULL,
                transaction_type TEXT NOT NULL,
                currency TEXT NOT NULL,
                category TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id),
                FOREIGN KEY(account_id) REFERENCES account(id)
                )",
        (),
    )?;

    // Composite index used by the paginated list query.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date
         ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, title, description, amount, cost, \
     grand_total, transaction_type, currency, category, date, created_at";

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let account_id = row.get(2)?;
    let title = row.get(3)?;
    let description = row.get(4)?;
    let amount = row.get(5)?;
    let cost = row.get(6)?;
    let grand_total = row.get(7)?;
    let transaction_type = row.get(8)?;
    let currency = row.get(9)?;
    let category = row.get(10)?;
    let date = row.get(11)?;
    let created_at = row.get(12)?;

    Ok(Transaction {
        id,
        user_id,
        account_id,
        title,
        description,
        amount,
        cost,
        grand_total,
        transaction_type,
        currency,
        category,
        date,
        created_at,
    })
}

/// Create a new transaction in the database.
///
/// The grand total is computed as `amount + cost`. The account balance is not
/// touched here; callers drive the ledger separately.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let grand_total = new_transaction.amount + new_transaction.cost;
    let created_at = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, account_id, title, description, amount, cost, grand_total,
                 transaction_type, currency, category, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                new_transaction.user_id.as_i64(),
                new_transaction.account_id,
                new_transaction.title,
                new_transaction.description,
                new_transaction.amount,
                new_transaction.cost,
                grand_total,
                new_transaction.transaction_type,
                new_transaction.currency,
                new_transaction.category,
                new_transaction.date,
                created_at,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the transaction with `id`, checking that it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingResource] if no transaction has `id`,
/// - or [Error::NotResourceOwner] if the transaction belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_owned_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection).map_err(|error| match error {
        Error::NotFound => Error::MissingResource("transaction"),
        error => error,
    })?;

    if transaction.user_id != user_id {
        return Err(Error::NotResourceOwner("transaction"));
    }

    Ok(transaction)
}

fn append_filter<'a>(
    sql: &mut String,
    params: &mut Vec<(&'static str, &'a dyn ToSql)>,
    filter: &'a TransactionFilter,
) {
    if let Some(account_id) = &filter.account_id {
        sql.push_str(" AND account_id = :account_id");
        params.push((":account_id", account_id));
    }

    if let Some(transaction_type) = &filter.transaction_type {
        sql.push_str(" AND transaction_type = :transaction_type");
        params.push((":transaction_type", transaction_type));
    }

    if let Some(category) = &filter.category {
        sql.push_str(" AND category = :category");
        params.push((":category", category));
    }

    if let Some(currency) = &filter.currency {
        sql.push_str(" AND currency = :currency");
        params.push((":currency", currency));
    }
}

/// Get a page of the user's transactions matching `filter`, most recent date
/// first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    user_id: UserId,
    filter: &TransactionFilter,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let user_id = user_id.as_i64();
    let mut sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE user_id = :user_id"
    );
    let mut params: Vec<(&'static str, &dyn ToSql)> = vec![(":user_id", &user_id)];

    append_filter(&mut sql, &mut params, filter);

    sql.push_str(" ORDER BY date DESC, id DESC LIMIT :limit OFFSET :offset");
    params.push((":limit", &limit));
    params.push((":offset", &offset));

    connection
        .prepare(&sql)?
        .query_map(params.as_slice(), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of the user's transactions matching `filter`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_transactions(
    user_id: UserId,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let user_id = user_id.as_i64();
    let mut sql = String::from("SELECT COUNT(id) FROM \"transaction\" WHERE user_id = :user_id");
    let mut params: Vec<(&'static str, &dyn ToSql)> = vec![(":user_id", &user_id)];

    append_filter(&mut sql, &mut params, filter);

    connection
        .prepare(&sql)?
        .query_one(params.as_slice(), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Get the income and expense grand totals over the user's transactions
/// matching `filter`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transaction_totals(
    user_id: UserId,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<TransactionTotals, Error> {
    let user_id = user_id.as_i64();
    let mut sql = String::from(
        "SELECT
            COALESCE(SUM(CASE WHEN transaction_type = 'income' THEN grand_total ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN transaction_type = 'expense' THEN grand_total ELSE 0 END), 0)
         FROM \"transaction\" WHERE user_id = :user_id",
    );
    let mut params: Vec<(&'static str, &dyn ToSql)> = vec![(":user_id", &user_id)];

    append_filter(&mut sql, &mut params, filter);

    connection
        .prepare(&sql)?
        .query_one(params.as_slice(), |row| {
            Ok(TransactionTotals {
                income: row.get(0)?,
                expense: row.get(1)?,
            })
        })
        .map_err(|error| error.into())
}

/// Get the user's income and expense grand totals per calendar month of
/// `year`, in month order. Months with no transactions are absent.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_monthly_totals(
    user_id: UserId,
    year: i32,
    connection: &Connection,
) -> Result<Vec<MonthlyTotals>, Error> {
    connection
        .prepare(
            "SELECT CAST(strftime('%m', date) AS INTEGER),
                COALESCE(SUM(CASE WHEN transaction_type = 'income' THEN grand_total ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'expense' THEN grand_total ELSE 0 END), 0)
             FROM \"transaction\"
             WHERE user_id = ?1 AND strftime('%Y', date) = ?2
             GROUP BY strftime('%m', date)
             ORDER BY strftime('%m', date)",
        )?
        .query_map((user_id.as_i64(), year.to_string()), |row| {
            Ok(MonthlyTotals {
                month: row.get(0)?,
                income: row.get(1)?,
                expense: row.get(2)?,
            })
        })?
        .map(|maybe_totals| maybe_totals.map_err(|error| error.into()))
        .collect()
}

/// Get the user's most recently recorded transactions, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_recent_transactions(
    user_id: UserId,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2"
        ))?
        .query_map((user_id.as_i64(), limit), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Get every transaction charged to `account_id`, most recent date first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_account_transactions(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE account_id = :account_id
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":account_id", &account_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the transaction's fields, recomputing the grand total.
///
/// The account balance is not touched here; callers drive the ledger
/// separately using the before and after snapshots.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingResource] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    update: &TransactionUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let grand_total = update.amount + update.cost;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET account_id = ?1, title = ?2, description = ?3, amount = ?4, cost = ?5,
             grand_total = ?6, transaction_type = ?7, currency = ?8, category = ?9, date = ?10
         WHERE id = ?11",
        (
            update.account_id,
            &update.title,
            &update.description,
            update.amount,
            update.cost,
            grand_total,
            update.transaction_type,
            &update.currency,
            &update.category,
            update.date,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::MissingResource("transaction"));
    }

    Ok(())
}

/// Delete the transaction with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingResource] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", (id,))?;

    if rows_affected == 0 {
        return Err(Error::MissingResource("transaction"));
    }

    Ok(())
}

/// Delete every transaction charged to `account_id`.
///
/// Only called as part of deleting the account itself.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn delete_account_transactions(
    account_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM \"transaction\" WHERE account_id = ?1",
        (account_id,),
    )?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod monthly_totals_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        transaction::{NewTransaction, TransactionType, create_transaction},
        user::UserId,
    };

    use super::{create_transaction_table, get_monthly_totals};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_transaction_table(&conn).unwrap();
        conn
    }

    fn insert(
        conn: &Connection,
        amount: f64,
        transaction_type: TransactionType,
        date: time::Date,
    ) {
        create_transaction(
            NewTransaction {
                user_id: UserId::new(1),
                account_id: None,
                title: "Weekly groceries".to_owned(),
                description: None,
                amount,
                cost: 0.0,
                transaction_type,
                currency: "NZD".to_owned(),
                category: None,
                date,
            },
            conn,
        )
        .expect("Could not insert transaction");
    }

    #[test]
    fn groups_by_month_within_year() {
        let conn = get_test_connection();
        insert(&conn, 100.0, TransactionType::Income, date!(2025 - 01 - 10));
        insert(&conn, 40.0, TransactionType::Expense, date!(2025 - 01 - 20));
        insert(&conn, 25.0, TransactionType::Expense, date!(2025 - 03 - 05));
        // A different year must not leak into the report.
        insert(&conn, 999.0, TransactionType::Expense, date!(2024 - 01 - 15));

        let totals = get_monthly_totals(UserId::new(1), 2025, &conn).unwrap();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].month, 1);
        assert_eq!(totals[0].income, 100.0);
        assert_eq!(totals[0].expense, 40.0);
        assert_eq!(totals[1].month, 3);
        assert_eq!(totals[1].expense, 25.0);
    }

    #[test]
    fn empty_years_report_nothing() {
        let conn = get_test_connection();

        let totals = get_monthly_totals(UserId::new(1), 2025, &conn).unwrap();

        assert!(totals.is_empty());
    }
}
