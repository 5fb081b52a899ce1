//! Categories for grouping transactions.
//!
//! A fixed set of default categories is shared by every user, and users may
//! add their own on top.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod create;
mod db;
mod defaults;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::create_category_endpoint;
pub use db::{create_category, create_category_table, delete_category, list_categories, update_category};
pub use defaults::seed_default_categories;
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryUpdate, NewCategory};
pub use edit::update_category_endpoint;
pub use list::list_categories_endpoint;

/// The state needed to manage categories.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
