//! Defines the endpoint for recording a new transaction.

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
    date_range::parse_date,
    extract::ValidatedJson,
    pagination::PaginationConfig,
    response::created,
    timezone::local_today,
    transaction::{NewTransaction, TransactionType, create_transaction},
};

/// The state needed to manage and summarize transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone that decides which date "today" is.
    pub local_timezone: String,
    /// The defaults for paging the transaction list.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The body for recording a transaction.
#[derive(Debug, Deserialize, Validate)]
pub struct TransactionForm {
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The amount of money, must be positive.
    #[validate(range(exclusive_min = 0.0, message = "amount must be greater than zero"))]
    pub amount: f64,
    /// The name of the category.
    #[validate(length(min = 1, max = 50, message = "category must be 1 to 50 characters long"))]
    pub category: String,
    /// What the transaction was for.
    #[validate(length(max = 500, message = "description must be at most 500 characters long"))]
    pub description: Option<String>,
    /// When the transaction happened, defaults to today.
    pub date: Option<String>,
}

/// Trim the category name, rejecting names that are only whitespace.
pub(crate) fn normalize_category(category: &str) -> Result<String, Error> {
    let category = category.trim();

    if category.is_empty() {
        return Err(Error::Validation("category must not be blank".to_owned()));
    }

    Ok(category.to_owned())
}

/// A route handler for recording a new transaction.
///
/// # Errors
///
/// Returns a 400 error if the body is not a valid transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ValidatedJson(form): ValidatedJson<TransactionForm>,
) -> Result<Response, Error> {
    let category = normalize_category(&form.category)?;
    let date = match form.date.as_deref() {
        Some(date) => parse_date("date", date)?,
        None => local_today(&state.local_timezone)?,
    };

    let mut new_transaction = NewTransaction::new(form.kind, form.amount, &category, date);
    new_transaction.description = form.description;

    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_transaction(user_id, new_transaction, &connection)?;

    Ok(created(transaction))
}
