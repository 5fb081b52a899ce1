//! Defines the endpoint for changing a transaction.

use axum::{Extension, extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    database_id::DatabaseId,
    date_range::parse_date,
    extract::{PathParam, ValidatedJson},
    response::ok,
    transaction::{
        TransactionState, TransactionType, TransactionUpdate, create_endpoint::normalize_category,
        update_transaction,
    },
};

/// The body for changing a transaction, omitted fields are left as they are.
#[derive(Debug, Deserialize, Validate)]
pub struct EditTransactionForm {
    /// The new type.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// The new amount, must be positive.
    #[validate(range(exclusive_min = 0.0, message = "amount must be greater than zero"))]
    pub amount: Option<f64>,
    /// The new category.
    #[validate(length(min = 1, max = 50, message = "category must be 1 to 50 characters long"))]
    pub category: Option<String>,
    /// The new description, an empty string clears it.
    #[validate(length(max = 500, message = "description must be at most 500 characters long"))]
    pub description: Option<String>,
    /// The new date.
    pub date: Option<String>,
}

impl EditTransactionForm {
    fn into_update(self) -> Result<TransactionUpdate, Error> {
        Ok(TransactionUpdate {
            kind: self.kind,
            amount: self.amount,
            category: self.category.as_deref().map(normalize_category).transpose()?,
            description: self.description,
            date: self
                .date
                .as_deref()
                .map(|date| parse_date("date", date))
                .transpose()?,
        })
    }
}

/// A route handler for changing one of the user's transactions.
///
/// # Errors
///
/// Returns a 400 error if the body is invalid and a 404 error if the user
/// has no transaction with the ID.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    PathParam(transaction_id): PathParam<DatabaseId>,
    ValidatedJson(form): ValidatedJson<EditTransactionForm>,
) -> Result<Response, Error> {
    let update = form.into_update()?;

    let connection = lock_connection(&state.db_connection)?;
    let transaction = update_transaction(transaction_id, user_id, update, &connection)?;

    Ok(ok(transaction))
}
