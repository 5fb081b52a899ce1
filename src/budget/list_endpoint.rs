//! Defines the endpoints for reading budgets and their health.

use axum::{Extension, extract::State, response::Response};

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    budget::{
        BudgetState, get_budget, list_budgets,
        evaluation::{decorate, decorate_all, spent_for_category, status_overview},
    },
    database_id::DatabaseId,
    extract::PathParam,
    response::ok,
    timezone::local_today,
};

/// A route handler for listing the user's budgets with their spending.
pub async fn list_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = lock_connection(&state.db_connection)?;
    let budgets = list_budgets(user_id, &connection)?;
    let budgets = decorate_all(user_id, budgets, today, &connection)?;

    Ok(ok(budgets))
}

/// A route handler for the health of every budget of the user, worst first.
pub async fn budget_status_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = lock_connection(&state.db_connection)?;
    let budgets = list_budgets(user_id, &connection)?;
    let budgets = decorate_all(user_id, budgets, today, &connection)?;

    Ok(ok(status_overview(budgets)))
}

/// A route handler for getting one of the user's budgets with its spending.
///
/// # Errors
///
/// Returns a 404 error if the user has no budget with the ID.
pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    PathParam(budget_id): PathParam<DatabaseId>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = lock_connection(&state.db_connection)?;
    let budget = get_budget(budget_id, user_id, &connection)?;
    let spent = spent_for_category(user_id, &budget.category, budget.period, today, &connection)?;

    Ok(ok(decorate(budget, spent)))
}
