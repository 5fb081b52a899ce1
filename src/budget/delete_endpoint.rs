//! Defines the endpoint for deleting a budget.

use axum::{Extension, extract::State, response::Response};

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    budget::{BudgetState, delete_budget},
    database_id::DatabaseId,
    extract::PathParam,
    response::message,
};

/// A route handler for deleting one of the user's budgets.
///
/// # Errors
///
/// Returns a 404 error if the user has no budget with the ID.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    PathParam(budget_id): PathParam<DatabaseId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_budget(budget_id, user_id, &connection)?;

    Ok(message("budget deleted successfully"))
}
