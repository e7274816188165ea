//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}',
//! use [format_endpoint].

/// The route to register a user.
pub const USERS: &str = "/api/users";
/// The route to verify a user's email address with a one-time password.
pub const VERIFY_USER: &str = "/api/users/verify";
/// The route for a user's dashboard summary.
pub const USER_SUMMARY: &str = "/api/users/summary";
/// The route for a user's income and expense stats.
pub const USER_MONEY_STATS: &str = "/api/users/money-stats";
/// The route to access a single user's profile.
pub const USER: &str = "/api/users/{user_id}";
/// The route to list the currencies used across a user's accounts.
pub const USER_CURRENCIES: &str = "/api/users/{user_id}/currencies";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route to request a password-reset one-time password.
pub const FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
/// The route to set a new password with a one-time password.
pub const RESET_PASSWORD: &str = "/api/auth/reset-password";
/// The route to access accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to list the distinct currencies over the caller's accounts.
pub const ACCOUNT_CURRENCIES: &str = "/api/accounts/currencies";
/// The route to access a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to read an account's balance history.
pub const ACCOUNT_BALANCE_HISTORY: &str = "/api/accounts/{account_id}/balance-history";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to access categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to access a single category by its slug.
pub const CATEGORY: &str = "/api/categories/{slug}";
/// The route to access properties.
pub const PROPERTIES: &str = "/api/properties";
/// The route to access a single property.
pub const PROPERTY: &str = "/api/properties/{property_id}";
/// The route to access debts.
pub const DEBTS: &str = "/api/debts";
/// The route to access a single debt.
pub const DEBT: &str = "/api/debts/{debt_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
