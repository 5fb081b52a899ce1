//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error,
    analytics::budget_vs_actual_endpoint,
    auth::{
        auth_guard, change_password, delete_account, get_profile, log_in, log_out,
        put_preferences, put_profile, refresh, register,
    },
    budget::{
        budget_status_endpoint, create_budget_endpoint, delete_budget_endpoint,
        edit_budget_endpoint, get_budget_endpoint, list_budgets_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
        update_category_endpoint,
    },
    endpoints,
    response::error_envelope,
    transaction::{
        by_category_endpoint, create_transaction_endpoint, delete_transaction_endpoint,
        edit_transaction_endpoint, forecast_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, summary_endpoint, trends_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::REFRESH, post(refresh))
        .route(endpoints::CATEGORIES, get(list_categories_endpoint));

    let protected_routes = Router::new()
        .route(endpoints::LOG_OUT, post(log_out))
        .route(endpoints::PROFILE, get(get_profile).put(put_profile))
        .route(endpoints::PREFERENCES, put(put_preferences))
        .route(endpoints::PASSWORD, put(change_password))
        .route(endpoints::ACCOUNT, axum::routing::delete(delete_account))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION_SUMMARY, get(summary_endpoint))
        .route(endpoints::TRANSACTIONS_BY_CATEGORY, get(by_category_endpoint))
        .route(endpoints::TRANSACTION_TRENDS, get(trends_endpoint))
        .route(endpoints::TRANSACTION_FORECAST, get(forecast_endpoint))
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(list_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(endpoints::BUDGET_STATUS, get(budget_status_endpoint))
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(edit_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(endpoints::CATEGORIES, post(create_category_endpoint))
        .route(
            endpoints::CATEGORY,
            put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(endpoints::BUDGET_VS_ACTUAL, get(budget_vs_actual_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(
            state.environment,
            error_envelope,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
