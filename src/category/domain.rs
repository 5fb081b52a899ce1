//! Core category domain types.

use serde::Serialize;
use validator::ValidationError;

use crate::{Error, auth::UserID, database_id::DatabaseId, transaction::TransactionType};

/// The icon given to categories created without one.
pub const DEFAULT_ICON: &str = "📁";

/// The color given to categories created without one.
pub const DEFAULT_COLOR: &str = "#6B7280";

/// A named group of transactions, e.g. 'groceries' or 'salary'.
///
/// Default categories are shared by every user and cannot be changed. All
/// other categories belong to exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: DatabaseId,
    /// The lowercase name of the category.
    pub name: String,
    /// The type of transaction the category is meant for.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// An icon shown next to the name.
    pub icon: String,
    /// The display color as a "#RRGGBB" code.
    pub color: String,
    /// Whether the category is one of the shared defaults.
    pub is_default: bool,
    /// The owner of the category, `None` for default categories.
    pub user_id: Option<UserID>,
}

/// The details needed to create a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    /// The name, see [normalize_category_name].
    pub name: String,
    /// The type of transaction the category is meant for.
    pub kind: TransactionType,
    /// An icon shown next to the name.
    pub icon: String,
    /// The display color as a "#RRGGBB" code.
    pub color: String,
}

/// A partial update to a category, `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub kind: Option<TransactionType>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Trim and lowercase a category name.
///
/// # Errors
///
/// Returns an [Error::Validation] if the name is blank.
pub fn normalize_category_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::Validation("name must not be blank".to_owned()))
    } else {
        Ok(name.to_lowercase())
    }
}

/// Check that `color` is a six digit hex color code such as "#10B981".
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let is_hex_code = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if is_hex_code {
        Ok(())
    } else {
        Err(ValidationError::new("color")
            .with_message("color must be a hex code such as #10B981".into()))
    }
}
