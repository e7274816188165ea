use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, balance_history, database_id::DatabaseId, user::UserId};

/// Alias for the id of an [Account].
pub type AccountId = DatabaseId;

/// A financial account (bank account, wallet, credit card) owned by a user.
///
/// `balance` is the authoritative cached value maintained by the ledger:
/// nothing else writes it, and every change appends a balance history
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The id of the user who owns the account.
    #[serde(rename = "user")]
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// The account number at the provider.
    pub number: Option<String>,
    /// The institution holding the account.
    pub provider: Option<String>,
    /// The kind of account, e.g. "checking" or "savings".
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    /// The ISO currency code for the account, e.g. "USD".
    pub currency: String,
    /// The current balance. Never negative.
    pub balance: f64,
    /// When the account was created.
    #[serde(rename = "createdAt")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to create a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// The id of the user who will own the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// The account number at the provider.
    pub number: Option<String>,
    /// The institution holding the account.
    pub provider: Option<String>,
    /// The kind of account, e.g. "checking" or "savings".
    pub account_type: Option<String>,
    /// The ISO currency code for the account.
    pub currency: String,
    /// The opening balance. Must not be negative.
    pub balance: f64,
}

/// The metadata fields an account update may change.
///
/// The balance is deliberately absent: it belongs to the ledger and only moves
/// when transactions do.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    /// The display name of the account.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// The account number at the provider.
    pub number: Option<String>,
    /// The institution holding the account.
    pub provider: Option<String>,
    /// The kind of account.
    pub account_type: Option<String>,
    /// The ISO currency code for the account.
    pub currency: String,
}

/// Per-account transaction totals for the money-stats report.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountTotals {
    /// The display name of the account.
    pub name: String,
    /// The current account balance.
    pub balance: f64,
    /// The sum of income grand totals charged to the account.
    pub income: f64,
    /// The sum of expense grand totals charged to the account.
    pub expense: f64,
}

/// Create the account table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            number TEXT,
            provider TEXT,
            account_type TEXT,
            currency TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let name = row.get(2)?;
    let description = row.get(3)?;
    let number = row.get(4)?;
    let provider = row.get(5)?;
    let account_type = row.get(6)?;
    let currency = row.get(7)?;
    let balance = row.get(8)?;
    let created_at = row.get(9)?;

    Ok(Account {
        id,
        user_id,
        name,
        description,
        number,
        provider,
        account_type,
        currency,
        balance,
        created_at,
    })
}

const ACCOUNT_COLUMNS: &str =
    "id, user_id, name, description, number, provider, account_type, currency, balance, created_at";

/// Create and insert a new account into the database.
///
/// The opening balance is recorded as the account's first balance history
/// snapshot.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn create_account(new_account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    let created_at = OffsetDateTime::now_utc();

    let id = connection.query_one(
        "INSERT INTO account
            (user_id, name, description, number, provider, account_type, currency, balance,
             created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         RETURNING id",
        (
            new_account.user_id.as_i64(),
            &new_account.name,
            &new_account.description,
            &new_account.number,
            &new_account.provider,
            &new_account.account_type,
            &new_account.currency,
            new_account.balance,
            created_at,
        ),
        |row| row.get(0),
    )?;

    balance_history::record(id, new_account.balance, connection)?;

    Ok(Account {
        id,
        user_id: new_account.user_id,
        name: new_account.name,
        description: new_account.description,
        number: new_account.number,
        provider: new_account.provider,
        account_type: new_account.account_type,
        currency: new_account.currency,
        balance: new_account.balance,
        created_at,
    })
}

/// Get the account with `account_id`, checking that it belongs to `user_id`.
///
/// # Errors
///
/// Returns [Error] if:
/// - no account has `account_id` ([Error::MissingResource]).
/// - the account belongs to another user ([Error::NotResourceOwner]).
/// - another SQL related error occurred ([Error::SqlError]).
pub fn get_owned_account(
    account_id: AccountId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = connection
        .query_one(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = :id"),
            &[(":id", &account_id)],
            map_row_to_account,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingResource("account"),
            error => error.into(),
        })?;

    if account.user_id != user_id {
        return Err(Error::NotResourceOwner("account"));
    }

    Ok(account)
}

/// Get the accounts owned by `user_id`, newest first.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn list_accounts(
    user_id: UserId,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3"
        ))?
        .query_map((user_id.as_i64(), limit, offset), map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the account's metadata fields.
///
/// The balance is not touched. Balances only move through the ledger.
///
/// # Errors
///
/// Returns [Error::MissingResource] if `account_id` does not belong to an
/// account, or [Error::SqlError] if an SQL related error occurred.
pub fn update_account(
    account_id: AccountId,
    update: &AccountUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account
         SET name = ?1, description = ?2, number = ?3, provider = ?4, account_type = ?5,
             currency = ?6
         WHERE id = ?7",
        (
            &update.name,
            &update.description,
            &update.number,
            &update.provider,
            &update.account_type,
            &update.currency,
            account_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::MissingResource("account"));
    }

    Ok(())
}

/// Delete the account row.
///
/// The caller is responsible for first removing the account's transactions and
/// balance history so no orphaned rows remain.
///
/// # Errors
///
/// Returns [Error::MissingResource] if `account_id` does not belong to an
/// account, or [Error::SqlError] if an SQL related error occurred.
pub fn delete_account(account_id: AccountId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM account WHERE id = ?1", (account_id,))?;

    if rows_affected == 0 {
        return Err(Error::MissingResource("account"));
    }

    Ok(())
}

/// Get the distinct currencies across the user's accounts, sorted.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn get_account_currencies(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    connection
        .prepare("SELECT DISTINCT currency FROM account WHERE user_id = :user_id ORDER BY currency")?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?
        .map(|maybe_currency| maybe_currency.map_err(|error| error.into()))
        .collect()
}

/// Get the sum of account balances for `user_id`, optionally restricted to one
/// currency.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn get_total_account_balance(
    user_id: UserId,
    currency: Option<&str>,
    connection: &Connection,
) -> Result<f64, Error> {
    let total = match currency {
        Some(currency) => connection.query_one(
            "SELECT COALESCE(SUM(balance), 0) FROM account WHERE user_id = ?1 AND currency = ?2",
            (user_id.as_i64(), currency),
            |row| row.get(0),
        ),
        None => connection.query_one(
            "SELECT COALESCE(SUM(balance), 0) FROM account WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        ),
    }?;

    Ok(total)
}

/// Get each of the user's accounts along with its income and expense
/// transaction totals, optionally restricted to one currency.
///
/// Accounts with no transactions report zero for both totals.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn get_account_totals(
    user_id: UserId,
    currency: Option<&str>,
    connection: &Connection,
) -> Result<Vec<AccountTotals>, Error> {
    let mut sql = "SELECT account.name, account.balance,
            COALESCE(SUM(CASE WHEN \"transaction\".transaction_type = 'income'
                THEN \"transaction\".grand_total ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN \"transaction\".transaction_type = 'expense'
                THEN \"transaction\".grand_total ELSE 0 END), 0)
         FROM account
         LEFT JOIN \"transaction\" ON \"transaction\".account_id = account.id
         WHERE account.user_id = :user_id"
        .to_owned();

    let user_id = user_id.as_i64();
    let mut params: Vec<(&'static str, &dyn rusqlite::ToSql)> = vec![(":user_id", &user_id)];

    if let Some(currency) = &currency {
        sql.push_str(" AND account.currency = :currency");
        params.push((":currency", currency));
    }

    sql.push_str(
        " GROUP BY account.id
         ORDER BY account.created_at DESC, account.id DESC",
    );

    connection
        .prepare(&sql)?
        .query_map(params.as_slice(), |row| {
            Ok(AccountTotals {
                name: row.get(0)?,
                balance: row.get(1)?,
                income: row.get(2)?,
                expense: row.get(3)?,
            })
        })?
        .map(|maybe_totals| maybe_totals.map_err(|error| error.into()))
        .collect()
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_account_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_account_table(&connection));
    }
}


#[cfg(test)]
mod account_totals_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        balance_history::create_balance_history_table,
        transaction::{
            NewTransaction, TransactionType, create_transaction, create_transaction_table,
        },
        user::UserId,
    };

    use super::{NewAccount, create_account, create_account_table, get_account_totals};

    fn get_test_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_account_table(&conn).expect("Could not create account table");
        create_balance_history_table(&conn).expect("Could not create balance history table");
        create_transaction_table(&conn).expect("Could not create transaction table");

        conn
    }

    fn insert_transaction(
        conn: &Connection,
        user_id: UserId,
        account_id: i64,
        amount: f64,
        transaction_type: TransactionType,
    ) {
        create_transaction(
            NewTransaction {
                user_id,
                account_id: Some(account_id),
                title: "Weekly groceries".to_owned(),
                description: None,
                amount,
                cost: 0.0,
                transaction_type,
                currency: "NZD".to_owned(),
                category: None,
                date: date!(2025 - 06 - 01),
            },
            conn,
        )
        .expect("Could not insert transaction");
    }

    #[test]
    fn totals_sum_income_and_expense_per_account() {
        let conn = get_test_connection();
        let user_id = UserId::new(1);
        let account = create_account(
            NewAccount {
                user_id,
                name: "Everyday".to_owned(),
                description: None,
                number: None,
                provider: None,
                account_type: None,
                currency: "NZD".to_owned(),
                balance: 500.0,
            },
            &conn,
        )
        .unwrap();
        insert_transaction(&conn, user_id, account.id, 100.0, TransactionType::Income);
        insert_transaction(&conn, user_id, account.id, 60.0, TransactionType::Income);
        insert_transaction(&conn, user_id, account.id, 25.0, TransactionType::Expense);

        let totals = get_account_totals(user_id, Some("NZD"), &conn).unwrap();

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].name, "Everyday");
        assert_eq!(totals[0].balance, 500.0);
        assert_eq!(totals[0].income, 160.0);
        assert_eq!(totals[0].expense, 25.0);
    }

    #[test]
    fn totals_report_zero_for_account_without_transactions() {
        let conn = get_test_connection();
        let user_id = UserId::new(1);
        create_account(
            NewAccount {
                user_id,
                name: "Savings".to_owned(),
                description: None,
                number: None,
                provider: None,
                account_type: None,
                currency: "NZD".to_owned(),
                balance: 1000.0,
            },
            &conn,
        )
        .unwrap();

        let totals = get_account_totals(user_id, None, &conn).unwrap();

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].income, 0.0);
        assert_eq!(totals[0].expense, 0.0);
    }
}
