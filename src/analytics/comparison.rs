//! Compares each budget with the actual spending in a date range.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    auth::UserID,
    budget::{BudgetPeriod, list_budgets},
    date_range::DateRange,
    transaction::aggregation::round_to_cents,
};

/// One budget next to what was actually spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetComparison {
    /// The budget's category.
    pub category: String,
    /// The budget's limit.
    pub budgeted: f64,
    /// The expenses in the category within the range.
    pub actual: f64,
    /// The budgeted amount minus the actual spending, negative when over budget.
    pub variance: f64,
    /// The variance as a percentage of the budgeted amount.
    pub variance_percent: f64,
    /// The budget's period.
    pub period: BudgetPeriod,
}

/// The sums over all compared budgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComparisonTotals {
    pub budgeted: f64,
    pub actual: f64,
    pub variance: f64,
}

/// Every budget compared with actual spending, most over budget first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub comparison: Vec<BudgetComparison>,
    pub totals: ComparisonTotals,
}

/// Compare one budgeted amount with the actual spending.
fn compare_one(category: String, budgeted: f64, actual: f64, period: BudgetPeriod) -> BudgetComparison {
    let variance = budgeted - actual;
    let variance_percent = if budgeted == 0.0 {
        0.0
    } else {
        100.0 * variance / budgeted
    };

    BudgetComparison {
        category,
        budgeted: round_to_cents(budgeted),
        actual: round_to_cents(actual),
        variance: round_to_cents(variance),
        variance_percent: round_to_cents(variance_percent),
        period,
    }
}

/// Compare all of the user's budgets with their expenses within `range`.
///
/// Unlike budget evaluation, the range is given by the caller rather than
/// derived from each budget's period. An open range covers all time. All
/// categories are summed in one grouped query.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn compare(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<ComparisonReport, Error> {
    let budgets = list_budgets(user_id, connection)?;

    let actuals = connection
        .prepare(
            "SELECT category, SUM(amount)
             FROM \"transaction\"
             WHERE user_id = ?1
               AND type = 'expense'
               AND (?2 IS NULL OR date >= ?2)
               AND (?3 IS NULL OR date <= ?3)
             GROUP BY category",
        )?
        .query_map((user_id.as_i64(), range.start, range.end), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .map(|total_result| total_result.map_err(Error::SqlError))
        .collect::<Result<HashMap<_, _>, _>>()?;

    let mut totals = ComparisonTotals::default();
    let mut comparison: Vec<BudgetComparison> = budgets
        .into_iter()
        .map(|budget| {
            let actual = actuals.get(&budget.category).copied().unwrap_or(0.0);
            totals.budgeted += budget.limit;
            totals.actual += actual;

            compare_one(budget.category, budget.limit, actual, budget.period)
        })
        .collect();
    comparison.sort_by(|a, b| a.variance.total_cmp(&b.variance));

    totals.budgeted = round_to_cents(totals.budgeted);
    totals.actual = round_to_cents(totals.actual);
    totals.variance = round_to_cents(totals.budgeted - totals.actual);

    Ok(ComparisonReport { comparison, totals })
}
