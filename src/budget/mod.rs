//! Spending limits per category and the evaluation of spending against them.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
pub(crate) mod evaluation;
mod list_endpoint;

pub use core::{
    Budget, BudgetPeriod, BudgetUpdate, NewBudget, create_budget, create_budget_table,
    delete_budget, get_budget, list_budgets, update_budget,
};
pub use create_endpoint::{BudgetState, create_budget_endpoint};
pub use delete_endpoint::delete_budget_endpoint;
pub use edit_endpoint::edit_budget_endpoint;
pub use list_endpoint::{budget_status_endpoint, get_budget_endpoint, list_budgets_endpoint};
