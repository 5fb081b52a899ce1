//! Defines the endpoint for creating a budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::Response,
};
use rusqlite::Connection;
use serde::Deserialize;
use validator::Validate;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::UserID,
    budget::{
        BudgetPeriod, NewBudget, create_budget,
        evaluation::{decorate, spent_for_category},
    },
    extract::ValidatedJson,
    response::created,
    timezone::local_today,
};

/// The state needed to manage and evaluate budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone that decides when a period starts.
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The body for creating a budget.
#[derive(Debug, Deserialize, Validate)]
pub struct BudgetForm {
    /// The transaction category to cover.
    #[validate(length(min = 1, max = 50, message = "category must be 1 to 50 characters long"))]
    pub category: String,
    /// The most to spend per period.
    #[validate(range(exclusive_min = 0.0, message = "limit must be greater than zero"))]
    pub limit: f64,
    /// How often spending starts from zero, defaults to monthly.
    #[serde(default)]
    pub period: BudgetPeriod,
}

/// Trim a budget category, rejecting names that are only whitespace.
pub(crate) fn normalize_budget_category(category: &str) -> Result<String, Error> {
    let category = category.trim();

    if category.is_empty() {
        Err(Error::Validation("category must not be blank".to_owned()))
    } else {
        Ok(category.to_owned())
    }
}

/// A route handler for creating a budget, responds with the budget and its
/// current spending.
///
/// # Errors
///
/// Returns a 409 error if the user already has a budget for the category and period.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ValidatedJson(form): ValidatedJson<BudgetForm>,
) -> Result<Response, Error> {
    let new_budget = NewBudget {
        category: normalize_budget_category(&form.category)?,
        limit: form.limit,
        period: form.period,
    };
    let today = local_today(&state.local_timezone)?;

    let connection = lock_connection(&state.db_connection)?;
    let budget = create_budget(user_id, new_budget, &connection)?;
    let spent = spent_for_category(user_id, &budget.category, budget.period, today, &connection)?;

    tracing::debug!("User {user_id} created budget {}", budget.id);

    Ok(created(decorate(budget, spent)))
}
