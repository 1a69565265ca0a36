// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

/// Composite uniqueness key of a fact row.
pub type FactKey = (i64, i64, i64);

/// One observed exchange rate, keyed into the star schema. Insert-only:
/// a key combination already in the warehouse is skipped on load, never
/// overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub date_key: i64,
    pub base_currency_key: i64,
    pub target_currency_key: i64,
    pub rate: f64,
}

impl FactRow {
    pub fn key(&self) -> FactKey {
        (
            self.date_key,
            self.base_currency_key,
            self.target_currency_key,
        )
    }
}
