// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration as StdDuration;

use crate::api::RatesClient;
use crate::cache::CacheStore;
use crate::error::EtlError;
use crate::report::RunReport;

// Pacing between requests and between backfill chunks, API friendliness.
const REQUEST_PAUSE: StdDuration = StdDuration::from_millis(20);
const CHUNK_PAUSE: StdDuration = StdDuration::from_secs(1);

/// The API has no data before this date.
fn api_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()
}

/// Inclusive lookback window of `days` days ending today.
pub fn lookback_window(days: u32) -> (NaiveDate, NaiveDate) {
    let end = Local::now().date_naive();
    let start = end - Duration::days(i64::from(days.max(1)) - 1);
    (start, end)
}

/// Split `[start, end]` into up to `chunks` contiguous chronological
/// sub-ranges of roughly equal size. The last chunk absorbs the remainder.
pub fn chunk_ranges(start: NaiveDate, end: NaiveDate, chunks: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let total_days = (end - start).num_days() + 1;
    if total_days <= 0 || chunks == 0 {
        return Vec::new();
    }
    let chunk_size = std::cmp::max(1, total_days / i64::from(chunks));

    let mut ranges = Vec::new();
    let mut chunk_start = start;
    for idx in 0..chunks {
        let mut chunk_end = chunk_start + Duration::days(chunk_size - 1);
        if idx == chunks - 1 || chunk_end > end {
            chunk_end = end;
        }
        ranges.push((chunk_start, chunk_end));
        chunk_start = chunk_end + Duration::days(1);
        if chunk_start > end {
            break;
        }
    }
    ranges
}

/// Fetch every date in `[start, end]` not already cached, appending
/// successes to the cache. Per-date failures go into the report and the
/// walk continues; only an auth failure aborts.
pub async fn fetch_range(
    client: &RatesClient,
    cache: &mut CacheStore,
    base: &str,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    report: &mut RunReport,
) -> Result<()> {
    let mut date = start;
    while date <= end {
        if cache.has(date) {
            report.already_cached += 1;
        } else {
            match client.get_historical(date, base, symbols).await {
                Ok(record) => {
                    cache.append(record)?;
                    report.fetched += 1;
                    tokio::time::sleep(REQUEST_PAUSE).await;
                }
                Err(EtlError::Auth(reason)) => return Err(EtlError::Auth(reason).into()),
                Err(err @ EtlError::Network { .. }) => report.record(err),
                Err(other) => return Err(other.into()),
            }
        }
        date += Duration::days(1);
    }
    Ok(())
}

/// One-time backfill: fetch `years` of history ending yesterday, split
/// into `chunks` chronological chunks for easier monitoring.
pub async fn backfill(
    client: &RatesClient,
    cache: &mut CacheStore,
    base: &str,
    symbols: &[String],
    years: u32,
    chunks: u32,
    report: &mut RunReport,
) -> Result<()> {
    let end = Local::now().date_naive() - Duration::days(1);
    let mut start = end - Duration::days(i64::from(years) * 365) + Duration::days(1);
    if start < api_floor() {
        start = api_floor();
    }

    let ranges = chunk_ranges(start, end, chunks);
    if ranges.is_empty() {
        println!("No ranges to process.");
        return Ok(());
    }

    let bar = ProgressBar::new(((end - start).num_days() + 1) as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} days {msg}",
    )?);

    for (idx, (chunk_start, chunk_end)) in ranges.iter().enumerate() {
        bar.set_message(format!("chunk {}/{}", idx + 1, ranges.len()));
        fetch_range(client, cache, base, symbols, *chunk_start, *chunk_end, report).await?;
        bar.inc(((*chunk_end - *chunk_start).num_days() + 1) as u64);
        tokio::time::sleep(CHUNK_PAUSE).await;
    }
    bar.finish_with_message("backfill complete");

    println!(
        "Backfill complete. Cache now holds {} records ({} added).",
        cache.len(),
        report.fetched
    );
    Ok(())
}
