//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, balance_history::create_balance_history_table,
    category::create_category_table, debt::create_debt_table, otp::create_otp_table,
    property::create_property_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the application tables in the database.
///
/// All tables are created inside a single exclusive transaction so that a
/// partially created schema is never left behind.
///
/// Uses `CREATE TABLE IF NOT EXISTS`, so running it against an existing
/// database is a no-op.
///
/// # Errors
/// Returns [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_otp_table(&transaction)?;
    create_account_table(&transaction)?;
    create_balance_history_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_category_table(&transaction)?;
    create_property_table(&transaction)?;
    create_debt_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
