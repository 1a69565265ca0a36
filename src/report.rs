// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;

use crate::error::EtlError;

/// Accumulates counts and per-record failures across a run. Per-record
/// problems never abort the batch; they land here and come out in the
/// summary.
#[derive(Debug, Default)]
pub struct RunReport {
    pub fetched: usize,
    pub already_cached: usize,
    pub failed_dates: Vec<(NaiveDate, String)>,
    pub invalid_seed_entries: Vec<(String, String)>,
    pub unknown_currencies: Vec<(NaiveDate, String)>,
    pub currencies_added: usize,
    pub time_rows: usize,
    pub facts_inserted: usize,
    pub facts_skipped: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a per-record failure into its summary bucket. Fatal variants
    /// don't belong here; callers propagate those with `?`.
    pub fn record(&mut self, err: EtlError) {
        match err {
            EtlError::Network { date, reason } => self.failed_dates.push((date, reason)),
            EtlError::Validation { entry, reason } => {
                self.invalid_seed_entries.push((entry, reason))
            }
            EtlError::Lookup { code, date } => self.unknown_currencies.push((date, code)),
            other => eprintln!("⚠️  {}", other),
        }
    }

    /// True if any per-record failure was collected.
    pub fn has_issues(&self) -> bool {
        !self.failed_dates.is_empty()
            || !self.invalid_seed_entries.is_empty()
            || !self.unknown_currencies.is_empty()
    }

    pub fn print_summary(&self) {
        println!("\n=== Run summary ===");
        println!(
            "Fetched {} new dates ({} already cached, {} failed)",
            self.fetched,
            self.already_cached,
            self.failed_dates.len()
        );
        println!(
            "Dimensions: {} new currencies, {} time rows",
            self.currencies_added, self.time_rows
        );
        println!(
            "Facts: {} inserted, {} skipped as duplicates",
            self.facts_inserted, self.facts_skipped
        );

        for (date, reason) in &self.failed_dates {
            eprintln!("⚠️  fetch failed for {}: {}", date, reason);
        }
        for (entry, reason) in &self.invalid_seed_entries {
            eprintln!("⚠️  seed entry {:?} skipped: {}", entry, reason);
        }
        if !self.unknown_currencies.is_empty() {
            eprintln!(
                "❌ {} fact rows referenced currencies missing from dim_currency (stale seed list):",
                self.unknown_currencies.len()
            );
            for (date, code) in &self.unknown_currencies {
                eprintln!("   {} on {}", code, date);
            }
        }
        if !self.has_issues() {
            println!("✅ No per-record failures");
        }
    }
}
