//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    database_id::DatabaseId,
    date_range::{DateRange, serialize_date},
    pagination::Page,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::Validation(format!(
                "type must be either \"income\" or \"expense\", got \"{other}\""
            ))),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.to_string().into()))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// The name of the category, stored as entered.
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// When the transaction happened.
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The details needed to record a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether money was earned or spent.
    pub kind: TransactionType,
    /// The amount of money, must be positive.
    pub amount: f64,
    /// The name of the category.
    pub category: String,
    /// An optional description.
    pub description: Option<String>,
    /// When the transaction happened.
    pub date: Date,
}

impl NewTransaction {
    /// Create a transaction with no description.
    pub fn new(kind: TransactionType, amount: f64, category: &str, date: Date) -> Self {
        Self {
            kind,
            amount,
            category: category.to_owned(),
            description: None,
            date,
        }
    }

    /// Set the description of the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
}

/// A partial update to a transaction, `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    /// The new type.
    pub kind: Option<TransactionType>,
    /// The new amount.
    pub amount: Option<f64>,
    /// The new category.
    pub category: Option<String>,
    /// The new description, an empty string clears it.
    pub description: Option<String>,
    /// The new date.
    pub date: Option<Date>,
}

/// Which transactions to list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Only include transactions of this type.
    pub kind: Option<TransactionType>,
    /// Only include transactions in this category.
    pub category: Option<String>,
    /// Only include transactions in this date range.
    pub range: DateRange,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                amount REAL NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL,
                description TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by listing, summaries and trends.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    // Used by budget spend and the budget vs. actual report.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_category
         ON \"transaction\"(user_id, category, type, date);",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str =
    "id, user_id, type, amount, category, description, date, created_at, updated_at";

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        kind: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Record a new transaction for the user.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, type, amount, category, description, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                new_transaction.kind,
                new_transaction.amount,
                new_transaction.category,
                new_transaction.description,
                new_transaction.date,
                now,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the user's transaction with the ID `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)?;

    Ok(transaction)
}

/// Apply `update` to the user's transaction with the ID `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: DatabaseId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET type = COALESCE(?3, type),
                 amount = COALESCE(?4, amount),
                 category = COALESCE(?5, category),
                 description = CASE WHEN ?6 IS NULL THEN description ELSE NULLIF(?6, '') END,
                 date = COALESCE(?7, date),
                 updated_at = ?8
             WHERE id = ?1 AND user_id = ?2
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                id,
                user_id.as_i64(),
                update.kind,
                update.amount,
                update.category,
                update.description,
                update.date,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete the user's transaction with the ID `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

const FILTER_CLAUSE: &str = "WHERE user_id = ?1
       AND (?2 IS NULL OR type = ?2)
       AND (?3 IS NULL OR category = ?3)
       AND (?4 IS NULL OR date >= ?4)
       AND (?5 IS NULL OR date <= ?5)";

/// Get one page of the user's transactions matching `filter`, newest first,
/// along with the number of matching transactions over all pages.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if `page` is too far out to address,
/// - or [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    page: Page,
    connection: &Connection,
) -> Result<(Vec<Transaction>, u64), Error> {
    let filter_params = (
        user_id.as_i64(),
        filter.kind,
        filter.category.as_deref(),
        filter.range.start,
        filter.range.end,
    );

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(id) FROM \"transaction\" {FILTER_CLAUSE}"),
        filter_params,
        |row| row.get(0),
    )?;
    let limit = page.limit()?;
    let offset = page.offset()?;

    // Sort by date, and then ID to keep transaction order stable after updates
    let transactions = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" {FILTER_CLAUSE}
             ORDER BY date DESC, id DESC
             LIMIT ?6 OFFSET ?7"
        ))?
        .query_map(
            (
                filter_params.0,
                filter_params.1,
                filter_params.2,
                filter_params.3,
                filter_params.4,
                limit,
                offset,
            ),
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((transactions, u64::try_from(total).unwrap_or_default()))
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use time::macros::date;

    use crate::{
        Error,
        date_range::DateRange,
        pagination::PaginationConfig,
        transaction::{
            NewTransaction, TransactionFilter, TransactionType, TransactionUpdate,
            create_transaction, delete_transaction, get_transaction, list_transactions,
            update_transaction,
        },
    };

    use super::test_utils::{get_test_connection, insert_test_user};

    #[test]
    fn create_then_get_round_trips() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);

        let created = create_transaction(
            user_id,
            NewTransaction::new(
                TransactionType::Expense,
                12.3,
                "Food & Dining",
                date!(2025 - 10 - 05),
            )
            .description("lunch"),
            &conn,
        )
        .unwrap();
        let got = get_transaction(created.id, user_id, &conn).unwrap();

        assert_eq!(got, created);
        assert_eq!(got.kind, TransactionType::Expense);
        assert_eq!(got.amount, 12.3);
        assert_eq!(got.category, "Food & Dining");
        assert_eq!(got.description.as_deref(), Some("lunch"));
        assert_eq!(got.date, date!(2025 - 10 - 05));
    }

    #[test]
    fn store_rejects_non_positive_amount() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);

        let result = create_transaction(
            user_id,
            NewTransaction::new(TransactionType::Expense, 0.0, "food", date!(2025 - 10 - 05)),
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn other_users_transactions_are_not_found() {
        let conn = get_test_connection();
        let owner = insert_test_user("a@example.com", &conn);
        let intruder = insert_test_user("b@example.com", &conn);
        let created = create_transaction(
            owner,
            NewTransaction::new(TransactionType::Income, 100.0, "salary", date!(2025 - 10 - 05)),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(created.id, intruder, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            update_transaction(
                created.id,
                intruder,
                TransactionUpdate {
                    amount: Some(1.0),
                    ..Default::default()
                },
                &conn
            ),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_transaction(created.id, intruder, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_changes_only_given_fields() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let created = create_transaction(
            user_id,
            NewTransaction::new(TransactionType::Expense, 10.0, "food", date!(2025 - 10 - 05)),
            &conn,
        )
        .unwrap();

        let updated = update_transaction(
            created.id,
            user_id,
            TransactionUpdate {
                amount: Some(25.5),
                date: Some(date!(2025 - 10 - 06)),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.amount, 25.5);
        assert_eq!(updated.date, date!(2025 - 10 - 06));
        assert_eq!(updated.category, "food");
        assert_eq!(updated.kind, TransactionType::Expense);
    }

    #[test]
    fn update_with_empty_description_clears_it() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let created = create_transaction(
            user_id,
            NewTransaction::new(TransactionType::Expense, 10.0, "food", date!(2025 - 10 - 05))
                .description("lunch"),
            &conn,
        )
        .unwrap();

        let kept = update_transaction(
            created.id,
            user_id,
            TransactionUpdate {
                amount: Some(12.0),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();
        let cleared = update_transaction(
            created.id,
            user_id,
            TransactionUpdate {
                description: Some(String::new()),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(kept.description.as_deref(), Some("lunch"));
        assert_eq!(cleared.description, None);
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let created = create_transaction(
            user_id,
            NewTransaction::new(TransactionType::Expense, 10.0, "food", date!(2025 - 10 - 05)),
            &conn,
        )
        .unwrap();

        delete_transaction(created.id, user_id, &conn).unwrap();

        assert_eq!(
            get_transaction(created.id, user_id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_filters_and_pages_newest_first() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let other_user = insert_test_user("b@example.com", &conn);
        for day in 1..=5 {
            let date = date!(2025 - 01 - 01).replace_day(day).unwrap();
            create_transaction(
                user_id,
                NewTransaction::new(TransactionType::Expense, day as f64, "food", date),
                &conn,
            )
            .unwrap();
        }
        create_transaction(
            user_id,
            NewTransaction::new(TransactionType::Income, 500.0, "salary", date!(2025 - 01 - 03)),
            &conn,
        )
        .unwrap();
        create_transaction(
            other_user,
            NewTransaction::new(TransactionType::Expense, 9.0, "food", date!(2025 - 01 - 03)),
            &conn,
        )
        .unwrap();

        let filter = TransactionFilter {
            kind: Some(TransactionType::Expense),
            category: Some("food".to_owned()),
            range: DateRange {
                start: Some(date!(2025 - 01 - 02)),
                end: Some(date!(2025 - 01 - 05)),
            },
        };
        let page = PaginationConfig::default().resolve(Some(1), Some(3));

        let (transactions, total) = list_transactions(user_id, &filter, page, &conn).unwrap();

        assert_eq!(total, 4);
        let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![5.0, 4.0, 3.0]);

        let second_page = PaginationConfig::default().resolve(Some(2), Some(3));
        let (transactions, _) = list_transactions(user_id, &filter, second_page, &conn).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, 2.0);
    }
}
