//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::FromRef,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, get_account_currencies_endpoint,
        get_account_endpoint, list_accounts_endpoint, update_account_endpoint,
    },
    auth::{
        AuthState, auth_guard, forgot_password_endpoint, log_in_endpoint, reset_password_endpoint,
    },
    balance_history::get_balance_history_endpoint,
    category::{create_category_endpoint, get_category_endpoint, list_categories_endpoint},
    debt::{
        create_debt_endpoint, delete_debt_endpoint, get_debt_endpoint, list_debts_endpoint,
        update_debt_endpoint,
    },
    endpoints,
    property::{
        create_property_endpoint, delete_property_endpoint, get_property_endpoint,
        list_properties_endpoint, update_property_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
    user::{
        get_money_stats_endpoint, get_summary_endpoint, get_user_currencies_endpoint,
        get_user_endpoint, register_user_endpoint, update_user_endpoint, verify_user_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(register_user_endpoint))
        .route(endpoints::VERIFY_USER, post(verify_user_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(endpoints::FORGOT_PASSWORD, post(forgot_password_endpoint))
        .route(endpoints::RESET_PASSWORD, post(reset_password_endpoint))
        // Category slugs are shareable links, so reading one stays public.
        .route(endpoints::CATEGORY, get(get_category_endpoint));

    let protected_routes = Router::new()
        .route(endpoints::USER_SUMMARY, get(get_summary_endpoint))
        .route(endpoints::USER_MONEY_STATS, get(get_money_stats_endpoint))
        .route(
            endpoints::USER,
            get(get_user_endpoint).patch(update_user_endpoint),
        )
        .route(
            endpoints::USER_CURRENCIES,
            get(get_user_currencies_endpoint),
        )
        .route(
            endpoints::ACCOUNTS,
            post(create_account_endpoint).get(list_accounts_endpoint),
        )
        .route(
            endpoints::ACCOUNT_CURRENCIES,
            get(get_account_currencies_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .patch(update_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT_BALANCE_HISTORY,
            get(get_balance_history_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(list_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            post(create_category_endpoint).get(list_categories_endpoint),
        )
        .route(
            endpoints::PROPERTIES,
            post(create_property_endpoint).get(list_properties_endpoint),
        )
        .route(
            endpoints::PROPERTY,
            get(get_property_endpoint)
                .patch(update_property_endpoint)
                .delete(delete_property_endpoint),
        )
        .route(
            endpoints::DEBTS,
            post(create_debt_endpoint).get(list_debts_endpoint),
        )
        .route(
            endpoints::DEBT,
            get(get_debt_endpoint)
                .patch(update_debt_endpoint)
                .delete(delete_debt_endpoint),
        )
        .layer(middleware::from_fn_with_state(
            AuthState::from_ref(&state),
            auth_guard,
        ));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The response for requests that match no route.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "ok": false,
            "message": "The requested resource does not exist.",
            "status": 404,
        })),
    )
        .into_response()
}
