//! Defines the endpoint for changing a budget.

use axum::{Extension, extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    budget::{
        BudgetPeriod, BudgetState, BudgetUpdate,
        create_endpoint::normalize_budget_category,
        evaluation::{decorate, spent_for_category},
        update_budget,
    },
    database_id::DatabaseId,
    extract::{PathParam, ValidatedJson},
    response::ok,
    timezone::local_today,
};

/// The body for changing a budget, omitted fields are left as they are.
#[derive(Debug, Deserialize, Validate)]
pub struct EditBudgetForm {
    /// The new category.
    #[validate(length(min = 1, max = 50, message = "category must be 1 to 50 characters long"))]
    pub category: Option<String>,
    /// The new limit.
    #[validate(range(exclusive_min = 0.0, message = "limit must be greater than zero"))]
    pub limit: Option<f64>,
    /// The new period.
    pub period: Option<BudgetPeriod>,
}

/// A route handler for changing one of the user's budgets.
///
/// # Errors
///
/// Returns a 404 error if the user has no budget with the ID and a 409 error
/// if another of the user's budgets has the resulting category and period.
pub async fn edit_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    PathParam(budget_id): PathParam<DatabaseId>,
    ValidatedJson(form): ValidatedJson<EditBudgetForm>,
) -> Result<Response, Error> {
    let update = BudgetUpdate {
        category: form
            .category
            .as_deref()
            .map(normalize_budget_category)
            .transpose()?,
        limit: form.limit,
        period: form.period,
    };
    let today = local_today(&state.local_timezone)?;

    let connection = lock_connection(&state.db_connection)?;
    let budget = update_budget(budget_id, user_id, update, &connection)?;
    let spent = spent_for_category(user_id, &budget.category, budget.period, today, &connection)?;

    Ok(ok(decorate(budget, spent)))
}
