// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::collections::HashMap;

use crate::error::EtlError;
use crate::models::{date_key, FactRow, RawRateRecord};
use crate::report::RunReport;

/// Flatten cached raw records into fact rows, resolving currency codes to
/// surrogate keys.
///
/// A code missing from the mapping means the seed list is stale: the
/// affected row (or the whole record, when the base code is unknown) is
/// skipped and the miss lands in the report instead of silently vanishing
/// from the counts.
pub fn flatten_records(
    records: &[RawRateRecord],
    mapping: &HashMap<String, i64>,
    report: &mut RunReport,
) -> Vec<FactRow> {
    let mut facts = Vec::new();
    for record in records {
        let base_currency_key = match mapping.get(record.base.as_str()) {
            Some(&key) => key,
            None => {
                report.record(EtlError::Lookup {
                    code: record.base.clone(),
                    date: record.date,
                });
                continue;
            }
        };
        let date_key = date_key(record.date);

        for (target, rate) in &record.rates {
            match mapping.get(target.as_str()) {
                Some(&target_currency_key) => facts.push(FactRow {
                    date_key,
                    base_currency_key,
                    target_currency_key,
                    rate: *rate,
                }),
                None => report.record(EtlError::Lookup {
                    code: target.clone(),
                    date: record.date,
                }),
            }
        }
    }

    facts.sort_by_key(|f| (f.date_key, f.target_currency_key));
    facts
}
