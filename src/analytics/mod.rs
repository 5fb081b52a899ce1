//! Reports that combine budgets with transactions.

mod budget_vs_actual_endpoint;
mod comparison;

pub use budget_vs_actual_endpoint::budget_vs_actual_endpoint;
