//! Defines the endpoint for changing a category.

use axum::{Extension, extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    category::{
        CategoryState, CategoryUpdate,
        domain::{normalize_category_name, validate_color},
        update_category,
    },
    database_id::DatabaseId,
    extract::{PathParam, ValidatedJson},
    response::ok,
    transaction::TransactionType,
};

/// The body for changing a category, omitted fields are left as they are.
#[derive(Debug, Deserialize, Validate)]
pub struct EditCategoryForm {
    /// The new name.
    #[validate(length(min = 1, max = 50, message = "name must be 1 to 50 characters long"))]
    pub name: Option<String>,
    /// The new type.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// The new icon.
    #[validate(length(min = 1, max = 20, message = "icon must be 1 to 20 characters long"))]
    pub icon: Option<String>,
    /// The new color.
    #[validate(custom(function = "validate_color"))]
    pub color: Option<String>,
}

/// A route handler for changing one of the caller's categories.
///
/// # Errors
///
/// Returns a 404 error for default categories and categories of other users.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    PathParam(category_id): PathParam<DatabaseId>,
    ValidatedJson(form): ValidatedJson<EditCategoryForm>,
) -> Result<Response, Error> {
    let update = CategoryUpdate {
        name: form.name.as_deref().map(normalize_category_name).transpose()?,
        kind: form.kind,
        icon: form.icon,
        color: form.color,
    };

    let connection = lock_connection(&state.db_connection)?;
    let category = update_category(category_id, user_id, update, &connection)?;

    Ok(ok(category))
}
