use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    account::{Account, AccountId, map_row_to_account},
    balance_history,
    transaction::{Transaction, TransactionUpdate},
    user::UserId,
};

/// How [reconcile_on_mutation] adjusted account balances.
#[derive(Debug, Clone, PartialEq)]
pub enum BalanceAdjustment {
    /// The transaction stayed on the same account (or had none): the net
    /// difference was applied in one step, clamping once. `None` when there
    /// was no account, nothing changed, or the account no longer exists.
    Net(Option<Account>),
    /// The transaction moved between accounts: the old contribution was
    /// reversed on the old account and the new contribution applied to the
    /// new account, each clamped independently.
    Moved {
        /// The old account after the reversal, when it was set and found.
        reversed: Option<Account>,
        /// The new account after the fresh application, when it was set and
        /// found.
        applied: Option<Account>,
    },
}

/// Move the balance of the account owned by `user_id` by `delta`, clamping the
/// result at zero, and append a balance history snapshot of the new value.
///
/// The clamp happens inside the UPDATE statement itself, so concurrent callers
/// can never observe or produce a negative balance, and the balance write and
/// history append share one database transaction: if the snapshot cannot be
/// written the balance change is rolled back.
///
/// Returns `Ok(None)` without touching anything when no account matches both
/// `account_id` and `user_id`. A missing or foreign account is not an error
/// here; callers decide whether that is worth reporting.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn apply(
    account_id: AccountId,
    user_id: UserId,
    delta: f64,
    connection: &Connection,
) -> Result<Option<Account>, Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let update_result = sql_transaction.query_one(
        "UPDATE account SET balance = MAX(0, balance + ?1)
         WHERE id = ?2 AND user_id = ?3
         RETURNING id, user_id, name, description, number, provider, account_type, currency,
             balance, created_at",
        (delta, account_id, user_id.as_i64()),
        map_row_to_account,
    );

    let account = match update_result {
        Ok(account) => account,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(error) => return Err(error.into()),
    };

    balance_history::record(account.id, account.balance, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Some(account))
}

/// Fold a newly created transaction into its account's balance.
///
/// Income adds `transaction.amount`, expense subtracts it. Returns `Ok(None)`
/// when the transaction has no account or the account cannot be found.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn reconcile_on_create(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<Option<Account>, Error> {
    let Some(account_id) = transaction.account_id else {
        return Ok(None);
    };

    let delta = transaction.transaction_type.sign() * transaction.amount;

    apply(account_id, transaction.user_id, delta, connection)
}

/// Adjust account balances after a transaction's fields were overwritten.
///
/// When the account stayed the same, the difference between the new and old
/// contributions is applied in a single step so the zero clamp can only
/// trigger once. When the account changed (including setting or clearing it),
/// the old contribution is reversed on the old account and the new one applied
/// to the new account, each clamping independently.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn reconcile_on_mutation(
    old_transaction: &Transaction,
    update: &TransactionUpdate,
    connection: &Connection,
) -> Result<BalanceAdjustment, Error> {
    let old_contribution = old_transaction.transaction_type.sign() * old_transaction.amount;
    let new_contribution = update.transaction_type.sign() * update.amount;

    if old_transaction.account_id == update.account_id {
        let Some(account_id) = update.account_id else {
            return Ok(BalanceAdjustment::Net(None));
        };

        let net_delta = new_contribution - old_contribution;

        if net_delta == 0.0 {
            return Ok(BalanceAdjustment::Net(None));
        }

        let account = apply(account_id, old_transaction.user_id, net_delta, connection)?;

        return Ok(BalanceAdjustment::Net(account));
    }

    let reversed = match old_transaction.account_id {
        Some(account_id) => apply(
            account_id,
            old_transaction.user_id,
            -old_contribution,
            connection,
        )?,
        None => None,
    };

    let applied = match update.account_id {
        Some(account_id) => apply(
            account_id,
            old_transaction.user_id,
            new_contribution,
            connection,
        )?,
        None => None,
    };

    Ok(BalanceAdjustment::Moved { reversed, applied })
}

/// Back a deleted transaction's contribution out of its account's balance.
///
/// The reverse of [reconcile_on_create]: deleting an income subtracts the
/// amount, deleting an expense restores it. Returns `Ok(None)` when the
/// transaction has no account or the account cannot be found.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn reconcile_on_delete(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<Option<Account>, Error> {
    let Some(account_id) = transaction.account_id else {
        return Ok(None);
    };

    let delta = -transaction.transaction_type.sign() * transaction.amount;

    apply(account_id, transaction.user_id, delta, connection)
}
