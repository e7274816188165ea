//! The append-only log of account balances.
//!
//! A snapshot is written whenever an account is created and whenever the
//! ledger moves its balance, so an account's history can always be replayed
//! in order.

mod core;
mod list_endpoint;

pub use core::{
    BalanceSnapshot, create_balance_history_table, list_snapshots, map_row_to_balance_snapshot,
    purge, record,
};
pub use list_endpoint::get_balance_history_endpoint;
