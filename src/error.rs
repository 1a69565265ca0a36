// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;
use thiserror::Error;

/// Failure taxonomy for a pipeline run.
///
/// `Auth` and `Warehouse` abort the run; the remaining variants are
/// collected per record into the [`crate::report::RunReport`] and only
/// surface in the end-of-run summary.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("invalid API credentials: {0}")]
    Auth(String),

    #[error("request for {date} failed: {reason}")]
    Network { date: NaiveDate, reason: String },

    #[error("invalid seed entry {entry:?}: {reason}")]
    Validation { entry: String, reason: String },

    #[error("currency {code} on {date} missing from dim_currency")]
    Lookup { code: String, date: NaiveDate },

    #[error("cache already holds a record for {0}")]
    DuplicateCacheEntry(NaiveDate),

    #[error("warehouse failure: {0}")]
    Warehouse(#[from] sqlx::Error),
}
