//! Expenses and income: the transaction rows, the queries over them, and the
//! endpoints for recording and managing them.
//!
//! Balance side effects live in [crate::ledger]; the functions here only read
//! and write transaction rows.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod get_endpoint;
mod list_endpoint;
mod update_endpoint;

pub use core::{
    MonthlyTotals, NewTransaction, Transaction, TransactionFilter, TransactionTotals,
    TransactionType, TransactionUpdate, count_transactions, create_transaction,
    create_transaction_table, delete_account_transactions, delete_transaction,
    get_account_transactions, get_monthly_totals, get_owned_transaction, get_recent_transactions,
    get_transaction, get_transaction_totals, list_transactions, map_transaction_row,
    update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use get_endpoint::get_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use update_endpoint::update_transaction_endpoint;
