//! Defines the endpoint for creating a category.

use axum::{Extension, extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    category::{
        CategoryState, NewCategory, create_category,
        domain::{DEFAULT_COLOR, DEFAULT_ICON, normalize_category_name, validate_color},
    },
    extract::ValidatedJson,
    response::created,
    transaction::TransactionType,
};

/// The body for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryForm {
    /// The name, stored in lowercase.
    #[validate(length(min = 1, max = 50, message = "name must be 1 to 50 characters long"))]
    pub name: String,
    /// The type of transaction the category is meant for.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// An icon shown next to the name.
    #[validate(length(min = 1, max = 20, message = "icon must be 1 to 20 characters long"))]
    pub icon: Option<String>,
    /// The display color as a "#RRGGBB" code.
    #[validate(custom(function = "validate_color"))]
    pub color: Option<String>,
}

/// A route handler for creating a category owned by the caller.
///
/// # Errors
///
/// Returns a 409 error if a default category or one of the caller's
/// categories already has the name.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ValidatedJson(form): ValidatedJson<CategoryForm>,
) -> Result<Response, Error> {
    let new_category = NewCategory {
        name: normalize_category_name(&form.name)?,
        kind: form.kind,
        icon: form.icon.unwrap_or_else(|| DEFAULT_ICON.to_owned()),
        color: form.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
    };

    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(user_id, new_category, &connection)?;

    Ok(created(category))
}
