// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::EtlError;
use crate::models::CurrencyDimRow;
use crate::report::RunReport;

/// One row of the seed list. The code field may carry several
/// comma-separated codes.
#[derive(Debug, Clone)]
pub struct SeedEntry {
    pub code: String,
    pub name: String,
}

/// Read the seed CSV (`currency_code,currency_name`, header row skipped).
pub fn read_seed(path: impl AsRef<Path>) -> Result<Vec<SeedEntry>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening seed list {}", path.display()))?;

    let mut entries = Vec::new();
    for result in reader.records() {
        let record = result?;
        let code = record.get(0).unwrap_or("").trim().to_string();
        if code.is_empty() {
            continue;
        }
        let name = record.get(1).unwrap_or("").trim().to_string();
        entries.push(SeedEntry { code, name });
    }
    Ok(entries)
}

/// Normalize and validate one currency code: exactly 3 ASCII letters,
/// uppercased.
fn validate_code(raw: &str) -> Result<String, String> {
    let code = raw.trim().to_uppercase();
    if code.len() != 3 {
        return Err(format!("expected 3 characters, got {}", code.len()));
    }
    if !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err("non-alphabetic characters".to_string());
    }
    Ok(code)
}

/// Existing `code -> key` mapping from the warehouse.
pub async fn load_mapping(pool: &SqlitePool) -> Result<HashMap<String, i64>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT currency_code, currency_key
        FROM dim_currency
        ORDER BY currency_key
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// All dimension rows, ordered by key.
pub async fn list_currencies(pool: &SqlitePool) -> Result<Vec<CurrencyDimRow>> {
    let rows = sqlx::query_as::<_, (i64, String, String)>(
        r#"
        SELECT currency_key, currency_code, currency_name
        FROM dim_currency
        ORDER BY currency_key
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(currency_key, currency_code, currency_name)| CurrencyDimRow {
            currency_key,
            currency_code,
            currency_name,
        })
        .collect())
}

/// Merge the seed list into `dim_currency` and return the resulting
/// mapping.
///
/// Codes not yet in the dimension get `max(existing key) + 1` in first-seen
/// seed order, so key assignment is stable across re-runs. Existing rows
/// keep their key forever; only the display name is refreshed. Malformed
/// entries are reported and skipped.
pub async fn merge_seed(
    pool: &SqlitePool,
    entries: &[SeedEntry],
    report: &mut RunReport,
) -> Result<HashMap<String, i64>> {
    let mut mapping = load_mapping(pool).await?;
    let mut next_key = mapping.values().copied().max().unwrap_or(0) + 1;

    // Stage (key, code, name) for every valid entry, assigning fresh keys
    // to unseen codes as they first appear.
    let mut staged: Vec<(i64, String, String)> = Vec::new();
    let mut seen = HashSet::new();
    for entry in entries {
        for raw in entry.code.split(',') {
            let code = match validate_code(raw) {
                Ok(code) => code,
                Err(reason) => {
                    report.record(EtlError::Validation {
                        entry: raw.trim().to_string(),
                        reason,
                    });
                    continue;
                }
            };
            if !seen.insert(code.clone()) {
                continue;
            }
            let key = match mapping.get(&code) {
                Some(&key) => key,
                None => {
                    let key = next_key;
                    next_key += 1;
                    mapping.insert(code.clone(), key);
                    report.currencies_added += 1;
                    key
                }
            };
            staged.push((key, code, entry.name.clone()));
        }
    }

    let mut tx = pool.begin().await?;
    for (key, code, name) in &staged {
        sqlx::query(
            r#"
            INSERT INTO dim_currency (currency_key, currency_code, currency_name)
            VALUES (?, ?, ?)
            ON CONFLICT(currency_code) DO UPDATE SET
                currency_name = excluded.currency_name,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(code)
        .bind(name)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use std::io::Write;

    fn entry(code: &str, name: &str) -> SeedEntry {
        SeedEntry {
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_keys_assigned_in_first_seen_order() -> Result<()> {
        let pool = db::create_test_pool().await?;
        let mut report = RunReport::new();

        let seed = [entry("USD", "US Dollar"), entry("EUR", "Euro")];
        let mapping = merge_seed(&pool, &seed, &mut report).await?;

        assert_eq!(mapping["USD"], 1);
        assert_eq!(mapping["EUR"], 2);
        assert_eq!(report.currencies_added, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_keys_stable_when_codes_added() -> Result<()> {
        let pool = db::create_test_pool().await?;
        let mut report = RunReport::new();

        merge_seed(
            &pool,
            &[entry("USD", "US Dollar"), entry("EUR", "Euro")],
            &mut report,
        )
        .await?;

        // New code appended, seed order otherwise unchanged
        let mapping = merge_seed(
            &pool,
            &[
                entry("USD", "US Dollar"),
                entry("EUR", "Euro"),
                entry("GBP", "British Pound"),
            ],
            &mut report,
        )
        .await?;

        assert_eq!(mapping["USD"], 1);
        assert_eq!(mapping["EUR"], 2);
        assert_eq!(mapping["GBP"], 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_reordered_seed_leaves_keys_untouched() -> Result<()> {
        let pool = db::create_test_pool().await?;
        let mut report = RunReport::new();

        merge_seed(
            &pool,
            &[entry("USD", "US Dollar"), entry("EUR", "Euro")],
            &mut report,
        )
        .await?;

        let mapping = merge_seed(
            &pool,
            &[entry("EUR", "Euro"), entry("USD", "US Dollar")],
            &mut report,
        )
        .await?;

        assert_eq!(mapping["USD"], 1);
        assert_eq!(mapping["EUR"], 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_reinstated_code_keeps_original_key() -> Result<()> {
        let pool = db::create_test_pool().await?;
        let mut report = RunReport::new();

        merge_seed(
            &pool,
            &[entry("USD", "US Dollar"), entry("EUR", "Euro")],
            &mut report,
        )
        .await?;

        // USD dropped from the seed: its dimension row stays put
        merge_seed(&pool, &[entry("EUR", "Euro")], &mut report).await?;
        let mapping = load_mapping(&pool).await?;
        assert_eq!(mapping["USD"], 1);

        // USD re-added later: original key, no reassignment
        let mapping = merge_seed(
            &pool,
            &[
                entry("EUR", "Euro"),
                entry("USD", "US Dollar"),
                entry("GBP", "British Pound"),
            ],
            &mut report,
        )
        .await?;
        assert_eq!(mapping["USD"], 1);
        assert_eq!(mapping["GBP"], 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_entries_reported_not_fatal() -> Result<()> {
        let pool = db::create_test_pool().await?;
        let mut report = RunReport::new();

        let seed = [
            entry("USD", "US Dollar"),
            entry("US1", "Bad digits"),
            entry("EURO", "Too long"),
            entry("usd", "Duplicate after normalization"),
        ];
        let mapping = merge_seed(&pool, &seed, &mut report).await?;

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["USD"], 1);
        assert_eq!(report.invalid_seed_entries.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_multi_code_entries_split() -> Result<()> {
        let pool = db::create_test_pool().await?;
        let mut report = RunReport::new();

        let mapping = merge_seed(&pool, &[entry("EUR,USD,GBP", "")], &mut report).await?;
        assert_eq!(mapping["EUR"], 1);
        assert_eq!(mapping["USD"], 2);
        assert_eq!(mapping["GBP"], 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_currencies() -> Result<()> {
        let pool = db::create_test_pool().await?;
        let mut report = RunReport::new();

        merge_seed(
            &pool,
            &[entry("AUD", "Australian Dollar"), entry("EUR", "Euro")],
            &mut report,
        )
        .await?;

        let rows = list_currencies(&pool).await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].currency_key, 1);
        assert_eq!(rows[0].currency_code, "AUD");
        assert_eq!(rows[0].currency_name, "Australian Dollar");
        Ok(())
    }

    #[test]
    fn test_read_seed_skips_header_and_blanks() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("currencies.csv");
        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "currency_code,currency_name")?;
        writeln!(file, "AUD,Australian Dollar")?;
        writeln!(file, ",")?;
        writeln!(file, "EUR,Euro")?;

        let entries = read_seed(&path)?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, "AUD");
        assert_eq!(entries[1].name, "Euro");
        Ok(())
    }
}
