// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// A row of the currency dimension. `currency_key` is assigned once when a
/// code first appears in the seed list and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyDimRow {
    pub currency_key: i64,
    pub currency_code: String,
    pub currency_name: String,
}

/// A row of the calendar dimension, derived entirely from the date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeDimRow {
    pub date_key: i64,
    pub date: NaiveDate,
    /// Monday = 1 .. Sunday = 7
    pub day_of_week: u32,
    pub day_name: String,
    pub is_weekend: bool,
    pub week_start_date: NaiveDate,
    pub month: u32,
    pub month_name: String,
    pub quarter: u32,
    pub year: i32,
}

/// YYYYMMDD integer key for a calendar date.
pub fn date_key(date: NaiveDate) -> i64 {
    date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64
}

impl TimeDimRow {
    /// Derive the full attribute set for one date. Pure: the same date
    /// always yields an identical row.
    pub fn for_date(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().number_from_monday();
        Self {
            date_key: date_key(date),
            date,
            day_of_week,
            day_name: date.format("%A").to_string(),
            is_weekend: day_of_week >= 6,
            week_start_date: date - Duration::days(i64::from(day_of_week) - 1),
            month: date.month(),
            month_name: date.format("%B").to_string(),
            quarter: (date.month() - 1) / 3 + 1,
            year: date.year(),
        }
    }
}
