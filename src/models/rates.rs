// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw API response as written to the cache store. Immutable once
/// cached; the cache holds at most one record per `date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRateRecord {
    /// Base currency the rates are quoted against.
    pub base: String,
    /// The trading date the rates belong to (not the fetch time).
    pub date: NaiveDate,
    /// Target currency code -> rate. BTreeMap keeps iteration order stable.
    pub rates: BTreeMap<String, f64>,
    /// The API's own epoch timestamp for the quote, when it sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Local-timezone stamp of when we fetched the payload.
    pub fetched_at: DateTime<Local>,
}
