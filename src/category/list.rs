//! Defines the endpoint for listing categories.

use axum::{extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::OptionalUser,
    category::{CategoryState, list_categories},
    extract::ValidatedQuery,
    response::ok,
    transaction::TransactionType,
};

/// The optional filter for the category list.
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryQuery {
    /// Only include categories for this type of transaction.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
}

/// A route handler for listing categories.
///
/// Anyone may list the default categories. Signed in users also get their
/// own categories.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    OptionalUser(user_id): OptionalUser,
    ValidatedQuery(query): ValidatedQuery<CategoryQuery>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let categories = list_categories(user_id, query.kind, &connection)?;

    Ok(ok(categories))
}
