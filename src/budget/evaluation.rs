//! Attaches live spending to budgets and classifies their health.
//!
//! Spending only counts expenses dated on or after the start of the budget's
//! current period. For lists of budgets, spending is computed with one
//! grouped query per distinct period instead of one query per budget.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    budget::{Budget, BudgetPeriod},
    date_range::{month_start, year_start},
    transaction::aggregation::round_to_cents,
};

/// Spending above this share of the limit earns a warning.
const WARNING_THRESHOLD: f64 = 0.8;

/// The first day of the current `period`, given that today is `today`.
pub fn period_start(period: BudgetPeriod, today: Date) -> Date {
    match period {
        BudgetPeriod::Monthly => month_start(today),
        BudgetPeriod::Yearly => year_start(today),
    }
}

/// The sum of the user's expenses in `category` since the start of the current `period`.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn spent_for_category(
    user_id: UserID,
    category: &str,
    period: BudgetPeriod,
    today: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let spent: f64 = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0.0)
         FROM \"transaction\"
         WHERE user_id = ?1 AND type = 'expense' AND category = ?2 AND date >= ?3",
        (user_id.as_i64(), category, period_start(period, today)),
        |row| row.get(0),
    )?;

    Ok(round_to_cents(spent))
}

/// The spending of every category and period that appears in `budgets`.
///
/// Runs one query per distinct period. Budgets whose category has no
/// expenses are missing from the map and count as zero.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn batch_spent(
    user_id: UserID,
    budgets: &[Budget],
    today: Date,
    connection: &Connection,
) -> Result<HashMap<(String, BudgetPeriod), f64>, Error> {
    let mut periods: Vec<BudgetPeriod> = Vec::new();
    for budget in budgets {
        if !periods.contains(&budget.period) {
            periods.push(budget.period);
        }
    }

    let mut statement = connection.prepare(
        "SELECT category, SUM(amount)
         FROM \"transaction\"
         WHERE user_id = ?1 AND type = 'expense' AND date >= ?2
         GROUP BY category",
    )?;

    let mut spent = HashMap::new();
    for period in periods {
        let rows = statement
            .query_map((user_id.as_i64(), period_start(period, today)), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?;

        for row in rows {
            let (category, total) = row?;
            spent.insert((category, period), round_to_cents(total));
        }
    }

    Ok(spent)
}

/// A budget together with how much of it has been used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetWithSpending {
    #[serde(flatten)]
    pub budget: Budget,
    /// The expenses in the current period.
    pub spent: f64,
    /// The limit minus the spending, negative when over budget.
    pub remaining: f64,
    /// The spending as a percentage of the limit, may exceed 100.
    pub percentage_used: f64,
}

/// Attach `spent` to `budget`.
pub fn decorate(budget: Budget, spent: f64) -> BudgetWithSpending {
    let remaining = budget.limit - spent;
    let percentage_used = 100.0 * spent / budget.limit;

    BudgetWithSpending {
        budget,
        spent,
        remaining,
        percentage_used,
    }
}

/// Attach spending to every budget using [batch_spent].
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn decorate_all(
    user_id: UserID,
    budgets: Vec<Budget>,
    today: Date,
    connection: &Connection,
) -> Result<Vec<BudgetWithSpending>, Error> {
    let spent = batch_spent(user_id, &budgets, today, connection)?;

    Ok(budgets
        .into_iter()
        .map(|budget| {
            let budget_spent = spent
                .get(&(budget.category.clone(), budget.period))
                .copied()
                .unwrap_or(0.0);
            decorate(budget, budget_spent)
        })
        .collect())
}

/// The health of a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// More than the limit has been spent.
    Over,
    /// More than 80% of the limit has been spent.
    Warning,
    /// Spending is within the limit.
    Ok,
}

/// Classify spending against a limit.
pub fn status(limit: f64, spent: f64) -> BudgetStatus {
    if spent > limit {
        BudgetStatus::Over
    } else if spent > WARNING_THRESHOLD * limit {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Ok
    }
}

/// A decorated budget with its health.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatusEntry {
    #[serde(flatten)]
    pub budget: BudgetWithSpending,
    pub status: BudgetStatus,
    pub is_over_budget: bool,
}

/// The sums over all budgets in a status overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTotals {
    pub budgeted: f64,
    pub spent: f64,
    pub remaining: f64,
}

/// How many budgets fall into each [BudgetStatus].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub over: usize,
    pub warning: usize,
    pub ok: usize,
}

/// Every budget with its health, worst first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverview {
    pub budgets: Vec<BudgetStatusEntry>,
    pub totals: StatusTotals,
    pub counts: StatusCounts,
}

/// Classify every budget and sort them over, then warning, then ok.
///
/// Budgets with the same status keep their order.
pub fn status_overview(budgets: Vec<BudgetWithSpending>) -> StatusOverview {
    let mut totals = StatusTotals::default();
    let mut counts = StatusCounts::default();

    let mut entries: Vec<BudgetStatusEntry> = budgets
        .into_iter()
        .map(|budget| {
            let status = status(budget.budget.limit, budget.spent);

            totals.budgeted += budget.budget.limit;
            totals.spent += budget.spent;
            match status {
                BudgetStatus::Over => counts.over += 1,
                BudgetStatus::Warning => counts.warning += 1,
                BudgetStatus::Ok => counts.ok += 1,
            }

            BudgetStatusEntry {
                budget,
                status,
                is_over_budget: status == BudgetStatus::Over,
            }
        })
        .collect();
    entries.sort_by_key(|entry| entry.status);

    totals.budgeted = round_to_cents(totals.budgeted);
    totals.spent = round_to_cents(totals.spent);
    totals.remaining = round_to_cents(totals.budgeted - totals.spent);

    StatusOverview {
        budgets: entries,
        totals,
        counts,
    }
}

#[cfg(test)]
mod evaluation_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        auth::UserID,
        budget::{Budget, BudgetPeriod, NewBudget, create_budget},
        transaction::{
            NewTransaction, TransactionType, create_transaction,
            test_utils::{get_test_connection, insert_test_user},
        },
    };

    use super::{
        BudgetStatus, batch_spent, decorate, decorate_all, period_start, spent_for_category,
        status, status_overview,
    };

    const TODAY: time::Date = date!(2025 - 06 - 15);

    fn budget(category: &str, limit: f64, period: BudgetPeriod) -> Budget {
        Budget {
            id: 1,
            user_id: UserID::new(1),
            category: category.to_owned(),
            limit,
            period,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn expense(conn: &Connection, user_id: UserID, amount: f64, category: &str, date: time::Date) {
        create_transaction(
            user_id,
            NewTransaction::new(TransactionType::Expense, amount, category, date),
            conn,
        )
        .unwrap();
    }

    #[test]
    fn period_starts_at_calendar_boundaries() {
        assert_eq!(period_start(BudgetPeriod::Monthly, TODAY), date!(2025 - 06 - 01));
        assert_eq!(period_start(BudgetPeriod::Yearly, TODAY), date!(2025 - 01 - 01));
        assert_eq!(
            period_start(BudgetPeriod::Monthly, date!(2025 - 06 - 01)),
            date!(2025 - 06 - 01)
        );
    }

    #[test]
    fn spent_counts_expenses_in_category_since_period_start() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let other_user = insert_test_user("b@example.com", &conn);
        expense(&conn, user_id, 100.0, "food", date!(2025 - 06 - 01));
        expense(&conn, user_id, 150.0, "food", date!(2025 - 06 - 14));
        expense(&conn, user_id, 999.0, "food", date!(2025 - 05 - 31));
        expense(&conn, user_id, 999.0, "rent", date!(2025 - 06 - 02));
        expense(&conn, other_user, 999.0, "food", date!(2025 - 06 - 02));
        create_transaction(
            user_id,
            NewTransaction::new(TransactionType::Income, 999.0, "food", date!(2025 - 06 - 03)),
            &conn,
        )
        .unwrap();

        let monthly =
            spent_for_category(user_id, "food", BudgetPeriod::Monthly, TODAY, &conn).unwrap();
        let yearly =
            spent_for_category(user_id, "food", BudgetPeriod::Yearly, TODAY, &conn).unwrap();
        let nothing =
            spent_for_category(user_id, "travel", BudgetPeriod::Monthly, TODAY, &conn).unwrap();

        assert_eq!(monthly, 250.0);
        assert_eq!(yearly, 1249.0);
        assert_eq!(nothing, 0.0);
    }

    #[test]
    fn batch_matches_single_lookups() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        expense(&conn, user_id, 40.0, "food", date!(2025 - 06 - 02));
        expense(&conn, user_id, 60.0, "food", date!(2025 - 02 - 02));
        expense(&conn, user_id, 500.0, "rent", date!(2025 - 06 - 01));
        let budgets: Vec<Budget> = [
            ("food", BudgetPeriod::Monthly),
            ("food", BudgetPeriod::Yearly),
            ("rent", BudgetPeriod::Monthly),
            ("travel", BudgetPeriod::Yearly),
        ]
        .into_iter()
        .map(|(category, period)| {
            create_budget(
                user_id,
                NewBudget {
                    category: category.to_owned(),
                    limit: 100.0,
                    period,
                },
                &conn,
            )
            .unwrap()
        })
        .collect();

        let spent = batch_spent(user_id, &budgets, TODAY, &conn).unwrap();

        for budget in &budgets {
            let expected =
                spent_for_category(user_id, &budget.category, budget.period, TODAY, &conn)
                    .unwrap();
            let got = spent
                .get(&(budget.category.clone(), budget.period))
                .copied()
                .unwrap_or(0.0);
            assert_eq!(got, expected, "{} {}", budget.category, budget.period);
        }

        let decorated = decorate_all(user_id, budgets, TODAY, &conn).unwrap();
        let spent: Vec<f64> = decorated.iter().map(|budget| budget.spent).collect();
        assert_eq!(spent, vec![40.0, 100.0, 500.0, 0.0]);
    }

    #[test]
    fn decorate_derives_remaining_and_percentage() {
        let got = decorate(budget("food", 500.0, BudgetPeriod::Monthly), 250.0);

        assert_eq!(got.spent, 250.0);
        assert_eq!(got.remaining, 250.0);
        assert_eq!(got.percentage_used, 50.0);

        let over = decorate(budget("food", 500.0, BudgetPeriod::Monthly), 550.0);
        assert_eq!(over.remaining, -50.0);
        assert_eq!(over.percentage_used, 110.0);
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(status(100.0, 0.0), BudgetStatus::Ok);
        assert_eq!(status(100.0, 80.0), BudgetStatus::Ok);
        assert_eq!(status(100.0, 80.01), BudgetStatus::Warning);
        assert_eq!(status(100.0, 100.0), BudgetStatus::Warning);
        assert_eq!(status(100.0, 100.01), BudgetStatus::Over);
    }

    #[test]
    fn overview_sorts_worst_first_and_keeps_order_within_status() {
        let budgets = vec![
            decorate(budget("a", 100.0, BudgetPeriod::Monthly), 10.0),
            decorate(budget("b", 100.0, BudgetPeriod::Monthly), 200.0),
            decorate(budget("c", 100.0, BudgetPeriod::Monthly), 90.0),
            decorate(budget("d", 100.0, BudgetPeriod::Monthly), 20.0),
            decorate(budget("e", 100.0, BudgetPeriod::Monthly), 150.0),
        ];

        let got = status_overview(budgets);

        let order: Vec<&str> = got
            .budgets
            .iter()
            .map(|entry| entry.budget.budget.category.as_str())
            .collect();
        assert_eq!(order, vec!["b", "e", "c", "a", "d"]);
        assert!(got.budgets[0].is_over_budget);
        assert!(!got.budgets[2].is_over_budget);
        assert_eq!((got.counts.over, got.counts.warning, got.counts.ok), (2, 1, 2));
        assert_eq!(got.totals.budgeted, 500.0);
        assert_eq!(got.totals.spent, 470.0);
        assert_eq!(got.totals.remaining, 30.0);
    }
}
