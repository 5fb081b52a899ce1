//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    auth::{create_refresh_token_table, create_user_table},
    budget::create_budget_table,
    category::{create_category_table, seed_default_categories},
    transaction::create_transaction_table,
};

/// Create the all of the database tables for the application and seed the
/// default categories.
///
/// This is safe to run on every start-up: tables and indexes are only created
/// if they are missing and the default categories are only inserted once.
///
/// # Errors
/// This function may return a [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_refresh_token_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    seed_default_categories(&transaction)?;

    transaction.commit()?;

    Ok(())
}
