//! The categories every user starts with.

use rusqlite::Connection;

use crate::transaction::TransactionType;

/// The shared categories as (name, type, icon, color).
pub const DEFAULT_CATEGORIES: [(&str, TransactionType, &str, &str); 13] = [
    ("salary", TransactionType::Income, "💼", "#10B981"),
    ("freelance", TransactionType::Income, "💻", "#3B82F6"),
    ("investments", TransactionType::Income, "📈", "#8B5CF6"),
    ("other income", TransactionType::Income, "💰", "#06B6D4"),
    ("food & dining", TransactionType::Expense, "🍔", "#EF4444"),
    ("transportation", TransactionType::Expense, "🚗", "#F59E0B"),
    ("shopping", TransactionType::Expense, "🛍️", "#EC4899"),
    ("entertainment", TransactionType::Expense, "🎬", "#8B5CF6"),
    ("bills & utilities", TransactionType::Expense, "💡", "#6366F1"),
    ("healthcare", TransactionType::Expense, "🏥", "#14B8A6"),
    ("education", TransactionType::Expense, "📚", "#0EA5E9"),
    ("travel", TransactionType::Expense, "✈️", "#F97316"),
    ("other expenses", TransactionType::Expense, "📦", "#6B7280"),
];

/// Insert any of the [DEFAULT_CATEGORIES] that are missing.
///
/// Existing default categories are left untouched, so this can run on every
/// start-up.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO category (name, type, icon, color, is_default, user_id)
         VALUES (?1, ?2, ?3, ?4, 1, NULL)",
    )?;

    let mut inserted = 0;
    for (name, kind, icon, color) in DEFAULT_CATEGORIES {
        inserted += statement.execute((name, kind, icon, color))?;
    }

    if inserted > 0 {
        tracing::info!("Seeded {inserted} default categories");
    }

    Ok(())
}
