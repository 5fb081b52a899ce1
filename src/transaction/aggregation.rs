//! Derived numeric views over a user's transactions.
//!
//! Sums and counts are computed by SQLite so that only aggregated rows are
//! loaded. Bucketing by week or month and the forecast heuristics are done in
//! Rust on those aggregated rows.

use std::collections::{BTreeMap, HashMap};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Error,
    auth::UserID,
    date_range::{DATE_FORMAT, DateRange, month_label, month_start, previous_month_start, week_start},
    transaction::TransactionType,
};

/// How many complete calendar months of history a forecast looks at.
pub const FORECAST_HISTORY_MONTHS: usize = 3;

/// Round a monetary value to two decimal places.
pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Income and expense totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// The sum of all income.
    pub income: f64,
    /// The sum of all expenses.
    pub expense: f64,
    /// Income minus expenses.
    pub balance: f64,
}

/// Sum the user's income and expenses within `range`.
///
/// Both sums are computed in a single pass. A type with no transactions sums to zero.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn summarize(user_id: UserID, range: DateRange, connection: &Connection) -> Result<Summary, Error> {
    let (income, expense): (f64, f64) = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0.0),
            COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0.0)
         FROM \"transaction\"
         WHERE user_id = ?1
           AND (?2 IS NULL OR date >= ?2)
           AND (?3 IS NULL OR date <= ?3)",
        (user_id.as_i64(), range.start, range.end),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(Summary {
        income: round_to_cents(income),
        expense: round_to_cents(expense),
        balance: round_to_cents(income - expense),
    })
}

// ============================================================================
// BY CATEGORY
// ============================================================================

/// The total and count of transactions in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category name.
    pub category: String,
    /// The sum of the amounts.
    pub total: f64,
    /// The number of transactions.
    pub count: i64,
    /// The type of the category's transactions.
    ///
    /// Categories are expected to hold one type only. If a category holds
    /// both, expense is reported.
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// Total the user's transactions within `range` per category, largest total first.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn totals_by_category(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT category, SUM(amount), COUNT(id), MIN(type)
             FROM \"transaction\"
             WHERE user_id = ?1
               AND (?2 IS NULL OR date >= ?2)
               AND (?3 IS NULL OR date <= ?3)
             GROUP BY category
             ORDER BY SUM(amount) DESC, category ASC",
        )?
        .query_map((user_id.as_i64(), range.start, range.end), |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: round_to_cents(row.get(1)?),
                count: row.get(2)?,
                kind: row.get(3)?,
            })
        })?
        .map(|total_result| total_result.map_err(Error::SqlError))
        .collect()
}

// ============================================================================
// TRENDS
// ============================================================================

/// The size of the time buckets in a trend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per calendar day.
    #[default]
    Day,
    /// One bucket per week, starting on Monday.
    Week,
    /// One bucket per calendar month.
    Month,
}

impl Granularity {
    /// The first day of the bucket that `date` falls in.
    fn bucket_start(self, date: Date) -> Date {
        match self {
            Granularity::Day => date,
            Granularity::Week => week_start(date),
            Granularity::Month => month_start(date),
        }
    }

    /// The label of the bucket starting on `bucket_start`.
    fn label(self, bucket_start: Date) -> Result<String, Error> {
        match self {
            Granularity::Day | Granularity::Week => bucket_start
                .format(DATE_FORMAT)
                .map_err(|error| Error::DateOutOfRange(error.to_string())),
            Granularity::Month => Ok(month_label(bucket_start)),
        }
    }
}

/// Income and expenses within one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// The bucket label, "2025-01-31" for days and weeks or "2025-01" for months.
    pub date: String,
    /// The sum of income in the bucket.
    pub income: f64,
    /// The sum of expenses in the bucket.
    pub expense: f64,
    /// Income minus expenses.
    pub balance: f64,
}

/// Bucket the user's transactions between `start` and `end` inclusive.
///
/// Only buckets containing transactions are returned, oldest first. When
/// `kind` is given the other type sums to zero in every bucket.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn trends(
    user_id: UserID,
    (start, end): (Date, Date),
    granularity: Granularity,
    kind: Option<TransactionType>,
    connection: &Connection,
) -> Result<Vec<TrendPoint>, Error> {
    let daily_totals = connection
        .prepare(
            "SELECT date, type, SUM(amount)
             FROM \"transaction\"
             WHERE user_id = ?1
               AND date BETWEEN ?2 AND ?3
               AND (?4 IS NULL OR type = ?4)
             GROUP BY date, type",
        )?
        .query_map((user_id.as_i64(), start, end, kind), |row| {
            Ok((
                row.get::<_, Date>(0)?,
                row.get::<_, TransactionType>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?
        .map(|total_result| total_result.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    let mut buckets: BTreeMap<Date, (f64, f64)> = BTreeMap::new();
    for (date, kind, total) in daily_totals {
        let bucket = buckets
            .entry(granularity.bucket_start(date))
            .or_insert((0.0, 0.0));
        match kind {
            TransactionType::Income => bucket.0 += total,
            TransactionType::Expense => bucket.1 += total,
        }
    }

    buckets
        .into_iter()
        .map(|(bucket_start, (income, expense))| {
            Ok(TrendPoint {
                date: granularity.label(bucket_start)?,
                income: round_to_cents(income),
                expense: round_to_cents(expense),
                balance: round_to_cents(income - expense),
            })
        })
        .collect()
}

// ============================================================================
// FORECAST
// ============================================================================

/// The expenses of one historical month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySpend {
    /// The month, e.g. "2025-01".
    pub month: String,
    /// The sum of expenses in the month.
    pub total: f64,
}

/// Projected spending based on recent months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    /// The average monthly spend over the months that had expenses.
    pub historical_average: f64,
    /// The average projected over `months` months.
    pub projected_spending: f64,
    /// How much to trust the projection, from 0 to 100.
    pub confidence: f64,
    /// The number of months projected.
    pub months: u32,
    /// The monthly totals the forecast was computed from, oldest first.
    pub history: Vec<MonthlySpend>,
}

/// Project the user's spending over the next `months` months.
///
/// The history is the [FORECAST_HISTORY_MONTHS] complete calendar months
/// before the month containing `today`, optionally limited to one category.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn forecast(
    user_id: UserID,
    months: u32,
    category: Option<&str>,
    today: Date,
    connection: &Connection,
) -> Result<Forecast, Error> {
    let mut history_months = Vec::with_capacity(FORECAST_HISTORY_MONTHS);
    let mut month = today;
    for _ in 0..FORECAST_HISTORY_MONTHS {
        month = previous_month_start(month);
        history_months.push(month);
    }
    history_months.reverse();

    let window_start = history_months[0];
    let window_end = month_start(today) - Duration::days(1);

    let monthly_totals = connection
        .prepare(
            "SELECT substr(date, 1, 7), SUM(amount)
             FROM \"transaction\"
             WHERE user_id = ?1
               AND type = 'expense'
               AND date BETWEEN ?2 AND ?3
               AND (?4 IS NULL OR category = ?4)
             GROUP BY substr(date, 1, 7)",
        )?
        .query_map(
            (user_id.as_i64(), window_start, window_end, category),
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
        )?
        .map(|total_result| total_result.map_err(Error::SqlError))
        .collect::<Result<HashMap<_, _>, _>>()?;

    let history: Vec<MonthlySpend> = history_months
        .into_iter()
        .map(|month| {
            let month = month_label(month);
            let total = monthly_totals.get(&month).copied().unwrap_or(0.0);
            MonthlySpend {
                month,
                total: round_to_cents(total),
            }
        })
        .collect();

    let observed: Vec<f64> = monthly_totals.into_values().collect();
    let (historical_average, projected_spending, confidence) = project(&observed, months);

    Ok(Forecast {
        historical_average,
        projected_spending,
        confidence,
        months,
        history,
    })
}

/// Average the observed monthly totals, project them over `months` and score
/// the projection.
///
/// The confidence is the share of the history window that had data, scaled
/// down by how much the monthly totals vary (their coefficient of variation,
/// capped at one). No data means zero confidence.
fn project(observed: &[f64], months: u32) -> (f64, f64, f64) {
    if observed.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let count = observed.len() as f64;
    let average = observed.iter().sum::<f64>() / count;
    let projected = average * f64::from(months);

    let confidence = if average > 0.0 {
        let variance = observed
            .iter()
            .map(|total| (total - average).powi(2))
            .sum::<f64>()
            / count;
        let coefficient_of_variation = variance.sqrt() / average;
        let coverage = (count / FORECAST_HISTORY_MONTHS as f64).min(1.0);

        coverage * (1.0 - coefficient_of_variation.min(1.0)) * 100.0
    } else {
        0.0
    };

    (
        round_to_cents(average),
        round_to_cents(projected),
        round_to_cents(confidence),
    )
}

#[cfg(test)]
mod aggregation_tests {
    use time::macros::date;

    use crate::{
        date_range::DateRange,
        transaction::{
            NewTransaction, TransactionType,
            core::test_utils::{get_test_connection, insert_test_user},
            create_transaction,
        },
    };

    use super::{
        CategoryTotal, Granularity, MonthlySpend, Summary, TrendPoint, forecast, project,
        round_to_cents, summarize, totals_by_category, trends,
    };

    fn insert(
        conn: &rusqlite::Connection,
        user_id: crate::auth::UserID,
        kind: TransactionType,
        amount: f64,
        category: &str,
        date: time::Date,
    ) {
        create_transaction(user_id, NewTransaction::new(kind, amount, category, date), conn)
            .expect("Could not create transaction");
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_to_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_to_cents(10.005_1), 10.01);
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);

        let got = summarize(user_id, DateRange::default(), &conn).unwrap();

        assert_eq!(
            got,
            Summary {
                income: 0.0,
                expense: 0.0,
                balance: 0.0,
            }
        );
    }

    #[test]
    fn summary_respects_range_and_owner() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let other_user = insert_test_user("b@example.com", &conn);
        insert(&conn, user_id, TransactionType::Income, 1000.0, "salary", date!(2025 - 01 - 15));
        insert(&conn, user_id, TransactionType::Expense, 250.5, "food", date!(2025 - 01 - 20));
        insert(&conn, user_id, TransactionType::Expense, 99.0, "food", date!(2025 - 02 - 01));
        insert(&conn, other_user, TransactionType::Income, 5.0, "salary", date!(2025 - 01 - 15));

        let range = DateRange {
            start: Some(date!(2025 - 01 - 01)),
            end: Some(date!(2025 - 01 - 31)),
        };
        let got = summarize(user_id, range, &conn).unwrap();

        assert_eq!(
            got,
            Summary {
                income: 1000.0,
                expense: 250.5,
                balance: 749.5,
            }
        );
    }

    #[test]
    fn by_category_is_sorted_by_total() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        insert(&conn, user_id, TransactionType::Expense, 10.0, "food", date!(2025 - 01 - 01));
        insert(&conn, user_id, TransactionType::Expense, 15.0, "food", date!(2025 - 01 - 02));
        insert(&conn, user_id, TransactionType::Income, 100.0, "salary", date!(2025 - 01 - 03));
        insert(&conn, user_id, TransactionType::Expense, 5.0, "travel", date!(2025 - 01 - 04));

        let got = totals_by_category(user_id, DateRange::default(), &conn).unwrap();

        assert_eq!(
            got,
            vec![
                CategoryTotal {
                    category: "salary".to_owned(),
                    total: 100.0,
                    count: 1,
                    kind: TransactionType::Income,
                },
                CategoryTotal {
                    category: "food".to_owned(),
                    total: 25.0,
                    count: 2,
                    kind: TransactionType::Expense,
                },
                CategoryTotal {
                    category: "travel".to_owned(),
                    total: 5.0,
                    count: 1,
                    kind: TransactionType::Expense,
                },
            ]
        );
    }

    #[test]
    fn trends_bucket_by_month() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        insert(&conn, user_id, TransactionType::Income, 100.0, "salary", date!(2025 - 01 - 05));
        insert(&conn, user_id, TransactionType::Expense, 30.0, "food", date!(2025 - 01 - 20));
        insert(&conn, user_id, TransactionType::Expense, 40.0, "food", date!(2025 - 03 - 02));
        insert(&conn, user_id, TransactionType::Expense, 1.0, "food", date!(2025 - 04 - 01));

        let got = trends(
            user_id,
            (date!(2025 - 01 - 01), date!(2025 - 03 - 31)),
            Granularity::Month,
            None,
            &conn,
        )
        .unwrap();

        assert_eq!(
            got,
            vec![
                TrendPoint {
                    date: "2025-01".to_owned(),
                    income: 100.0,
                    expense: 30.0,
                    balance: 70.0,
                },
                TrendPoint {
                    date: "2025-03".to_owned(),
                    income: 0.0,
                    expense: 40.0,
                    balance: -40.0,
                },
            ]
        );
    }

    #[test]
    fn trends_bucket_by_week_from_monday() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        // Wednesday and Sunday of the same week, then the next Monday.
        insert(&conn, user_id, TransactionType::Expense, 10.0, "food", date!(2025 - 01 - 01));
        insert(&conn, user_id, TransactionType::Expense, 20.0, "food", date!(2025 - 01 - 05));
        insert(&conn, user_id, TransactionType::Expense, 5.0, "food", date!(2025 - 01 - 06));

        let got = trends(
            user_id,
            (date!(2025 - 01 - 01), date!(2025 - 01 - 31)),
            Granularity::Week,
            None,
            &conn,
        )
        .unwrap();

        let labels: Vec<&str> = got.iter().map(|point| point.date.as_str()).collect();
        assert_eq!(labels, vec!["2024-12-30", "2025-01-06"]);
        assert_eq!(got[0].expense, 30.0);
        assert_eq!(got[1].expense, 5.0);
    }

    #[test]
    fn trends_filter_by_type() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        insert(&conn, user_id, TransactionType::Income, 100.0, "salary", date!(2025 - 01 - 05));
        insert(&conn, user_id, TransactionType::Expense, 30.0, "food", date!(2025 - 01 - 05));

        let got = trends(
            user_id,
            (date!(2025 - 01 - 01), date!(2025 - 01 - 31)),
            Granularity::Day,
            Some(TransactionType::Expense),
            &conn,
        )
        .unwrap();

        assert_eq!(
            got,
            vec![TrendPoint {
                date: "2025-01-05".to_owned(),
                income: 0.0,
                expense: 30.0,
                balance: -30.0,
            }]
        );
    }

    #[test]
    fn forecast_without_history_has_no_confidence() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);

        let got = forecast(user_id, 3, None, date!(2025 - 04 - 15), &conn).unwrap();

        assert_eq!(got.historical_average, 0.0);
        assert_eq!(got.projected_spending, 0.0);
        assert_eq!(got.confidence, 0.0);
        assert_eq!(got.months, 3);
        assert_eq!(got.history.len(), 3);
    }

    #[test]
    fn forecast_uses_previous_three_complete_months() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        insert(&conn, user_id, TransactionType::Expense, 999.0, "food", date!(2024 - 12 - 31));
        insert(&conn, user_id, TransactionType::Expense, 300.0, "food", date!(2025 - 01 - 10));
        insert(&conn, user_id, TransactionType::Expense, 200.0, "food", date!(2025 - 02 - 10));
        insert(&conn, user_id, TransactionType::Expense, 100.0, "food", date!(2025 - 02 - 11));
        insert(&conn, user_id, TransactionType::Expense, 300.0, "rent", date!(2025 - 03 - 31));
        insert(&conn, user_id, TransactionType::Income, 5000.0, "salary", date!(2025 - 03 - 01));
        insert(&conn, user_id, TransactionType::Expense, 999.0, "food", date!(2025 - 04 - 01));

        let got = forecast(user_id, 2, None, date!(2025 - 04 - 15), &conn).unwrap();

        assert_eq!(got.historical_average, 300.0);
        assert_eq!(got.projected_spending, 600.0);
        assert_eq!(got.confidence, 100.0);
        assert_eq!(
            got.history,
            vec![
                MonthlySpend {
                    month: "2025-01".to_owned(),
                    total: 300.0,
                },
                MonthlySpend {
                    month: "2025-02".to_owned(),
                    total: 300.0,
                },
                MonthlySpend {
                    month: "2025-03".to_owned(),
                    total: 300.0,
                },
            ]
        );
    }

    #[test]
    fn forecast_filters_by_category() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        insert(&conn, user_id, TransactionType::Expense, 120.0, "food", date!(2025 - 03 - 10));
        insert(&conn, user_id, TransactionType::Expense, 800.0, "rent", date!(2025 - 03 - 01));

        let got = forecast(user_id, 1, Some("food"), date!(2025 - 04 - 15), &conn).unwrap();

        assert_eq!(got.historical_average, 120.0);
        assert_eq!(got.projected_spending, 120.0);
        assert_eq!(got.confidence, 33.33);
    }

    #[test]
    fn confidence_drops_with_variation() {
        let (_, _, steady) = project(&[100.0, 100.0, 100.0], 1);
        let (_, _, varied) = project(&[50.0, 100.0, 150.0], 1);
        let (_, _, sparse) = project(&[100.0], 1);

        assert_eq!(steady, 100.0);
        assert!(varied < steady);
        assert!(varied > 0.0);
        assert_eq!(sparse, 33.33);
    }
}
