//! Income and expense transactions.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the database functions for storing and querying it
//! - Aggregations over transactions: summaries, totals per category, trends and forecasts
//! - The route handlers for the transaction endpoints

pub(crate) mod aggregation;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod stats_endpoint;

pub use core::{
    NewTransaction, Transaction, TransactionFilter, TransactionType, TransactionUpdate,
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    list_transactions, update_transaction,
};
pub use create_endpoint::{TransactionState, create_transaction_endpoint};
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::{get_transaction_endpoint, list_transactions_endpoint};
pub use stats_endpoint::{by_category_endpoint, forecast_endpoint, summary_endpoint, trends_endpoint};

#[cfg(test)]
pub(crate) use core::test_utils;
