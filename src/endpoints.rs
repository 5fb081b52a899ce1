//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/budgets/{budget_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for exchanging a refresh token for a new token pair.
pub const REFRESH: &str = "/api/auth/refresh";
/// The route for the client to log out the current session.
pub const LOG_OUT: &str = "/api/auth/logout";
/// The route to read and update the current user's profile.
pub const PROFILE: &str = "/api/auth/profile";
/// The route to update the current user's notification preferences.
pub const PREFERENCES: &str = "/api/auth/preferences";
/// The route to change the current user's password.
pub const PASSWORD: &str = "/api/auth/password";
/// The route to delete the current user's account.
pub const ACCOUNT: &str = "/api/auth/account";

/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for income and expense totals.
pub const TRANSACTION_SUMMARY: &str = "/api/transactions/summary";
/// The route for totals per category.
pub const TRANSACTIONS_BY_CATEGORY: &str = "/api/transactions/by-category";
/// The route for income and expenses bucketed over time.
pub const TRANSACTION_TRENDS: &str = "/api/transactions/trends";
/// The route for projected spending.
pub const TRANSACTION_FORECAST: &str = "/api/transactions/forecast";

/// The route to create and list budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route for the health of every budget.
pub const BUDGET_STATUS: &str = "/api/budgets/status";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";

/// The route to create and list categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to update or delete a custom category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

/// The route comparing budgets with actual spending.
pub const BUDGET_VS_ACTUAL: &str = "/api/analytics/budget-vs-actual";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// Only the first parameter is replaced, e.g. "/api/budgets/{budget_id}" becomes
/// "/api/budgets/1".
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
