//! Money lent to or borrowed from people outside the app.
//!
//! Debts are tracked separately from accounts and never touch cached
//! balances. Settling a debt is an update that flips its status.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod get_endpoint;
mod list_endpoint;
mod update_endpoint;

pub use core::{
    Debt, DebtStatus, DebtType, DebtUpdate, NewDebt, count_debts, create_debt, create_debt_table,
    delete_debt, get_owned_debt, list_debts, map_row_to_debt, update_debt,
};
pub use create_endpoint::create_debt_endpoint;
pub use delete_endpoint::delete_debt_endpoint;
pub use get_endpoint::get_debt_endpoint;
pub use list_endpoint::list_debts_endpoint;
pub use update_endpoint::update_debt_endpoint;
