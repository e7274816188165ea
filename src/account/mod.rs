//! Accounts hold a cached balance that transactions adjust.
//!
//! The cached balance is never recomputed from scratch. Every transaction
//! write goes through [crate::ledger] so the balance and its history stay
//! in step with the rows in the transaction table.

mod core;
mod create_endpoint;
mod currencies_endpoint;
mod delete_endpoint;
mod get_endpoint;
mod list_endpoint;
mod update_endpoint;

pub use core::{
    Account, AccountId, AccountTotals, AccountUpdate, NewAccount, create_account,
    create_account_table, delete_account, get_account_currencies, get_account_totals,
    get_owned_account, get_total_account_balance, list_accounts, map_row_to_account,
    update_account,
};
pub use create_endpoint::create_account_endpoint;
pub use currencies_endpoint::get_account_currencies_endpoint;
pub use delete_endpoint::delete_account_endpoint;
pub use get_endpoint::get_account_endpoint;
pub use list_endpoint::list_accounts_endpoint;
pub use update_endpoint::update_account_endpoint;
