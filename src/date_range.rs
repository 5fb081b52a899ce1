//! Date range parsing for the query strings of list and analytics endpoints.

use serde::{Deserialize, Serializer};
use time::{
    Date, Duration, OffsetDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};
use validator::Validate;

use crate::Error;

/// The calendar date format used in requests and responses, e.g. "2025-01-31".
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Serializes a [time::Date] as "2025-01-31" rather than time's default
/// tuple format.
pub fn serialize_date<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

/// An inclusive range of dates where either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// The earliest date to include.
    pub start: Option<Date>,
    /// The latest date to include.
    pub end: Option<Date>,
}

impl DateRange {
    /// Parse a range from the raw query string values.
    ///
    /// # Errors
    /// Returns [Error::Validation] if either value is not a date or timestamp,
    /// or if the start is after the end.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, Error> {
        let start = start.map(|value| parse_date("startDate", value)).transpose()?;
        let end = end.map(|value| parse_date("endDate", value)).transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(Error::Validation(
                    "startDate must not be after endDate".to_owned(),
                ));
            }
        }

        Ok(Self { start, end })
    }

    /// Require both ends of the range to be set.
    ///
    /// # Errors
    /// Returns [Error::Validation] naming the missing bound.
    pub fn bounded(self) -> Result<(Date, Date), Error> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(Error::Validation(
                "startDate and endDate are required".to_owned(),
            )),
        }
    }
}

/// Parse either a calendar date ("2025-01-31") or an RFC 3339 timestamp
/// ("2025-01-31T12:00:00Z"), keeping only the date.
///
/// `field` names the input in the error message.
pub(crate) fn parse_date(field: &str, value: &str) -> Result<Date, Error> {
    let value = value.trim();

    Date::parse(value, DATE_FORMAT)
        .or_else(|_| OffsetDateTime::parse(value, &Rfc3339).map(|timestamp| timestamp.date()))
        .map_err(|_| Error::Validation(format!("{field} must be a valid date, got \"{value}\"")))
}

/// The Monday of the week containing `date`.
pub(crate) fn week_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.weekday().number_days_from_monday()))
}

/// The first day of the month containing `date`.
pub(crate) fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// The first day of the month before the one containing `date`.
pub(crate) fn previous_month_start(date: Date) -> Date {
    month_start(month_start(date) - Duration::days(1))
}

/// January 1 of the year containing `date`.
pub(crate) fn year_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.ordinal()) - 1)
}

/// Format the month containing `date` as "2025-01".
pub(crate) fn month_label(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// The optional `startDate` and `endDate` query parameters.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    /// The earliest date to include.
    pub start_date: Option<String>,
    /// The latest date to include.
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// Parse the query into a [DateRange].
    pub fn to_range(&self) -> Result<DateRange, Error> {
        DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())
    }
}
