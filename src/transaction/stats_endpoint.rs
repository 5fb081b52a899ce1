//! Defines the endpoints serving totals, trends and forecasts over transactions.

use axum::{Extension, extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    date_range::{DateRange, DateRangeQuery},
    extract::ValidatedQuery,
    response::ok,
    timezone::local_today,
    transaction::{
        TransactionState, TransactionType,
        aggregation::{Granularity, forecast, summarize, totals_by_category, trends},
    },
};

/// The query for bucketing transactions over time.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrendsQuery {
    /// The first date to include, required.
    pub start_date: Option<String>,
    /// The last date to include, required.
    pub end_date: Option<String>,
    /// The bucket size, defaults to days.
    #[serde(default)]
    pub group_by: Granularity,
    /// Only include this type of transaction.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
}

/// The query for projecting spending.
#[derive(Debug, Deserialize, Validate)]
pub struct ForecastQuery {
    /// How many months to project over, defaults to three.
    #[validate(range(min = 1, max = 12, message = "months must be between 1 and 12"))]
    pub months: Option<u32>,
    /// Only project spending in this category.
    pub category: Option<String>,
}

const DEFAULT_FORECAST_MONTHS: u32 = 3;

/// A route handler for the user's income and expense totals.
pub async fn summary_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ValidatedQuery(query): ValidatedQuery<DateRangeQuery>,
) -> Result<Response, Error> {
    let range = query.to_range()?;

    let connection = lock_connection(&state.db_connection)?;
    let summary = summarize(user_id, range, &connection)?;

    Ok(ok(summary))
}

/// A route handler for the user's totals per category.
pub async fn by_category_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ValidatedQuery(query): ValidatedQuery<DateRangeQuery>,
) -> Result<Response, Error> {
    let range = query.to_range()?;

    let connection = lock_connection(&state.db_connection)?;
    let totals = totals_by_category(user_id, range, &connection)?;

    Ok(ok(totals))
}

/// A route handler for the user's income and expenses over time.
///
/// # Errors
///
/// Returns a 400 error unless both `startDate` and `endDate` are given.
pub async fn trends_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ValidatedQuery(query): ValidatedQuery<TrendsQuery>,
) -> Result<Response, Error> {
    let bounds =
        DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())?.bounded()?;

    let connection = lock_connection(&state.db_connection)?;
    let points = trends(user_id, bounds, query.group_by, query.kind, &connection)?;

    Ok(ok(points))
}

/// A route handler for the user's projected spending.
pub async fn forecast_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ValidatedQuery(query): ValidatedQuery<ForecastQuery>,
) -> Result<Response, Error> {
    let months = query.months.unwrap_or(DEFAULT_FORECAST_MONTHS);
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty());
    let today = local_today(&state.local_timezone)?;

    let connection = lock_connection(&state.db_connection)?;
    let forecast = forecast(user_id, months, category, today, &connection)?;

    Ok(ok(forecast))
}
