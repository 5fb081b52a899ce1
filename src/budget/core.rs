//! Defines the core data models and database queries for budgets.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::UserID, database_id::DatabaseId};

// ============================================================================
// MODELS
// ============================================================================

/// How often a budget's spending starts again from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    /// From the first day of each calendar month.
    #[default]
    Monthly,
    /// From January 1 of each calendar year.
    Yearly,
}

impl BudgetPeriod {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }
}

impl Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            other => Err(Error::Validation(format!(
                "period must be either \"monthly\" or \"yearly\", got \"{other}\""
            ))),
        }
    }
}

impl ToSql for BudgetPeriod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetPeriod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.to_string().into()))
    }
}

/// A spending limit for one category over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: DatabaseId,
    /// The user that set the budget.
    pub user_id: UserID,
    /// The transaction category the budget covers.
    pub category: String,
    /// The most the user intends to spend per period, always positive.
    pub limit: f64,
    /// How often spending is counted from zero.
    pub period: BudgetPeriod,
    /// When the budget was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the budget was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The details needed to create a budget.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub category: String,
    pub limit: f64,
    pub period: BudgetPeriod,
}

/// A partial update to a budget, `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetUpdate {
    pub category: Option<String>,
    pub limit: Option<f64>,
    pub period: Option<BudgetPeriod>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the budget table in the database.
///
/// A user has at most one budget per category and period.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category TEXT NOT NULL,
            spending_limit REAL NOT NULL CHECK (spending_limit > 0),
            period TEXT NOT NULL CHECK (period IN ('monthly', 'yearly')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_budget_user_category_period
            ON budget(user_id, category, period);",
    )?;

    Ok(())
}

const BUDGET_COLUMNS: &str = "id, user_id, category, spending_limit, period, created_at, updated_at";

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category: row.get(2)?,
        limit: row.get(3)?,
        period: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn duplicate_budget() -> Error {
    Error::Conflict("a budget for this category and period already exists".to_owned())
}

/// Whether the user has a budget other than `except_id` for the category and period.
fn budget_exists(
    user_id: UserID,
    category: &str,
    period: BudgetPeriod,
    except_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<bool, Error> {
    let exists = connection.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM budget
            WHERE user_id = ?1 AND category = ?2 AND period = ?3
              AND (?4 IS NULL OR id != ?4)
        )",
        (user_id.as_i64(), category, period, except_id),
        |row| row.get(0),
    )?;

    Ok(exists)
}

/// Create a budget for the user.
///
/// # Errors
/// This function will return a:
/// - [Error::Conflict] if the user already has a budget for the category and period,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    user_id: UserID,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    if budget_exists(user_id, &new_budget.category, new_budget.period, None, connection)? {
        return Err(duplicate_budget());
    }

    let now = OffsetDateTime::now_utc();

    let budget = connection
        .prepare(&format!(
            "INSERT INTO budget (user_id, category, spending_limit, period, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                new_budget.category,
                new_budget.limit,
                new_budget.period,
                now,
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Retrieve the user's budget with the ID `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget(id: DatabaseId, user_id: UserID, connection: &Connection) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_budget_row)?;

    Ok(budget)
}

/// Retrieve all of the user's budgets in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE user_id = ?1 ORDER BY id ASC"
        ))?
        .query_map((user_id.as_i64(),), map_budget_row)?
        .map(|budget_result| budget_result.map_err(Error::SqlError))
        .collect()
}

/// Apply `update` to the user's budget with the ID `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by the user,
/// - [Error::Conflict] if another of the user's budgets has the resulting category and period,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_budget(
    id: DatabaseId,
    user_id: UserID,
    update: BudgetUpdate,
    connection: &Connection,
) -> Result<Budget, Error> {
    let current = get_budget(id, user_id, connection)?;
    let category = update.category.as_deref().unwrap_or(&current.category);
    let period = update.period.unwrap_or(current.period);

    if budget_exists(user_id, category, period, Some(id), connection)? {
        return Err(duplicate_budget());
    }

    let budget = connection
        .prepare(&format!(
            "UPDATE budget
             SET category = ?3,
                 spending_limit = COALESCE(?4, spending_limit),
                 period = ?5,
                 updated_at = ?6
             WHERE id = ?1 AND user_id = ?2
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                id,
                user_id.as_i64(),
                category,
                update.limit,
                period,
                OffsetDateTime::now_utc(),
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Delete the user's budget with the ID `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_budget(id: DatabaseId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
