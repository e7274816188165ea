//! Keeps account balances consistent with the transactions that reference
//! them.
//!
//! Every transaction create, update, and delete goes through here: the ledger
//! owns the rule that a balance moves by `sign(type) * amount`, never drops
//! below zero, and leaves a balance history snapshot behind for every value it
//! takes.

mod core;

pub use core::{
    BalanceAdjustment, apply, reconcile_on_create, reconcile_on_delete, reconcile_on_mutation,
};
