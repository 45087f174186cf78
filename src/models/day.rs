use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Wire format for every calendar date
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> AppResult<Date> {
    Date::parse(value, DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: Date) -> String {
    // The format only has numeric components, formatting cannot fail for a valid Date
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Day {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub date: Date,
    pub info: Option<String>,
}

/// One requested date of a project with its optional note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub date: Date,
    /// `None` leaves an existing note untouched
    pub info: Option<String>,
}

impl DayEntry {
    pub fn new(date: Date, info: Option<String>) -> Self {
        Self { date, info }
    }

    /// Convert the `{date: note|null}` request map into entries
    pub fn from_map(days: &BTreeMap<String, Option<String>>) -> AppResult<Vec<DayEntry>> {
        days.iter()
            .map(|(date, info)| Ok(DayEntry::new(parse_date(date)?, info.clone())))
            .collect()
    }
}
