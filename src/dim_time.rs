// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use sqlx::sqlite::SqlitePool;

use crate::models::TimeDimRow;

/// One row per calendar date in `[min, max]`, inclusive. Pure: the same
/// range always yields the identical set.
pub fn generate(min: NaiveDate, max: NaiveDate) -> Vec<TimeDimRow> {
    let mut rows = Vec::new();
    let mut date = min;
    while date <= max {
        rows.push(TimeDimRow::for_date(date));
        date += Duration::days(1);
    }
    rows
}

/// Truncate and reload `dim_time` to cover `[min, max]`. Returns the row
/// count written.
pub async fn rebuild(pool: &SqlitePool, min: NaiveDate, max: NaiveDate) -> Result<usize> {
    let rows = generate(min, max);

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM dim_time").execute(&mut *tx).await?;
    for row in &rows {
        sqlx::query(
            r#"
            INSERT INTO dim_time (
                date_key, date, day_of_week, day_name, is_weekend,
                week_start_date, month, month_name, quarter, year
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.date_key)
        .bind(row.date.to_string())
        .bind(i64::from(row.day_of_week))
        .bind(&row.day_name)
        .bind(row.is_weekend)
        .bind(row.week_start_date.to_string())
        .bind(i64::from(row.month))
        .bind(&row.month_name)
        .bind(i64::from(row.quarter))
        .bind(i64::from(row.year))
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(rows.len())
}
