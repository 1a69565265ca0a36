// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::api::RatesClient;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::report::RunReport;
use crate::{dim_currency, dim_time, fetch, load, transform};

/// Transform-and-load half of the run: cache -> dimensions -> facts.
/// Touches no network; safe to repeat over the same cache.
pub async fn load_phase(cfg: &Config, pool: &SqlitePool, report: &mut RunReport) -> Result<()> {
    let cache = CacheStore::open(&cfg.cache_path)?;
    let records = cache.read_all();
    if records.is_empty() {
        println!("Cache is empty, nothing to load.");
        return Ok(());
    }

    let seed = dim_currency::read_seed(&cfg.seed_path)?;
    let mapping = dim_currency::merge_seed(pool, &seed, report).await?;

    let facts = transform::flatten_records(&records, &mapping, report);

    // read_all is date-ordered, so the cache span is first..last. The cache
    // holds every date ever loaded, which makes it the fact span too.
    let min = records[0].date;
    let max = records[records.len() - 1].date;
    report.time_rows = dim_time::rebuild(pool, min, max).await?;

    let outcome = load::load_facts(pool, &facts).await?;
    report.facts_inserted = outcome.inserted;
    report.facts_skipped = outcome.skipped;

    println!(
        "Total rows in fact_exchange_rate: {}",
        load::count_facts(pool).await?
    );
    Ok(())
}

/// The scheduled job: fetch the lookback window into the cache, then load.
pub async fn run(
    cfg: &Config,
    pool: &SqlitePool,
    client: &RatesClient,
    report: &mut RunReport,
) -> Result<()> {
    let mut cache = CacheStore::open(&cfg.cache_path)?;
    let (start, end) = fetch::lookback_window(cfg.fetch_days);
    fetch::fetch_range(
        client,
        &mut cache,
        &cfg.base_currency,
        &cfg.symbols,
        start,
        end,
        report,
    )
    .await?;
    drop(cache);

    load_phase(cfg, pool, report).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::RawRateRecord;
    use chrono::{Local, NaiveDate};
    use std::collections::BTreeMap;
    use std::io::Write;
    use std::path::Path;

    fn test_config(dir: &Path) -> Config {
        Config {
            base_currency: "AUD".to_string(),
            symbols: vec!["USD".to_string(), "EUR".to_string()],
            cache_path: dir.join("cache.json").to_string_lossy().into_owned(),
            seed_path: dir.join("currencies.csv").to_string_lossy().into_owned(),
            database_url: "sqlite::memory:".to_string(),
            api_base_url: "http://127.0.0.1:1".to_string(),
            fetch_days: 1,
            backfill_years: 1,
            backfill_chunks: 1,
        }
    }

    fn write_seed(path: &str, codes: &[(&str, &str)]) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        writeln!(file, "currency_code,currency_name")?;
        for (code, name) in codes {
            writeln!(file, "{},{}", code, name)?;
        }
        Ok(())
    }

    fn record(base: &str, date: &str, rates: &[(&str, f64)]) -> RawRateRecord {
        RawRateRecord {
            base: base.to_string(),
            date: date.parse().unwrap(),
            rates: rates
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect::<BTreeMap<_, _>>(),
            timestamp: None,
            fetched_at: Local::now(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_load_and_rerun() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = test_config(dir.path());
        let pool = db::create_test_pool().await?;

        write_seed(
            &cfg.seed_path,
            &[
                ("AUD", "Australian Dollar"),
                ("USD", "US Dollar"),
                ("EUR", "Euro"),
            ],
        )?;

        let mut cache = CacheStore::open(&cfg.cache_path)?;
        cache.append(record("AUD", "2024-01-01", &[("USD", 0.66), ("EUR", 0.61)]))?;
        drop(cache);

        let mut report = RunReport::new();
        load_phase(&cfg, &pool, &mut report).await?;

        assert_eq!(report.currencies_added, 3);
        assert_eq!(report.time_rows, 1);
        assert_eq!(report.facts_inserted, 2);
        assert_eq!(report.facts_skipped, 0);

        let rows = sqlx::query_as::<_, (i64, i64, i64, f64)>(
            r#"
            SELECT date_key, base_currency_key, target_currency_key, rate
            FROM fact_exchange_rate
            ORDER BY target_currency_key
            "#,
        )
        .fetch_all(&pool)
        .await?;

        assert_eq!(rows.len(), 2);
        // Seed order AUD, USD, EUR -> keys 1, 2, 3
        assert_eq!(rows[0], (20240101, 1, 2, 0.66));
        assert_eq!((rows[1].0, rows[1].1, rows[1].2), (20240101, 1, 3));
        approx::assert_relative_eq!(rows[1].3, 0.61);

        // Immediate re-run over the same cache inserts nothing
        let mut rerun = RunReport::new();
        load_phase(&cfg, &pool, &mut rerun).await?;
        assert_eq!(rerun.facts_inserted, 0);
        assert_eq!(rerun.facts_skipped, 2);
        assert_eq!(load::count_facts(&pool).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_seed_is_flagged() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = test_config(dir.path());
        let pool = db::create_test_pool().await?;

        // SGD missing from the seed, present in the fetched rates
        write_seed(&cfg.seed_path, &[("AUD", ""), ("USD", "")])?;

        let mut cache = CacheStore::open(&cfg.cache_path)?;
        cache.append(record("AUD", "2024-01-01", &[("USD", 0.66), ("SGD", 0.88)]))?;
        drop(cache);

        let mut report = RunReport::new();
        load_phase(&cfg, &pool, &mut report).await?;

        assert_eq!(report.facts_inserted, 1);
        assert_eq!(report.unknown_currencies, vec![("2024-01-01".parse::<NaiveDate>()?, "SGD".to_string())]);
        assert!(report.has_issues());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_cache_loads_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = test_config(dir.path());
        let pool = db::create_test_pool().await?;
        write_seed(&cfg.seed_path, &[("AUD", "")])?;

        let mut report = RunReport::new();
        load_phase(&cfg, &pool, &mut report).await?;

        assert_eq!(report.facts_inserted, 0);
        assert_eq!(load::count_facts(&pool).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_refetch_with_full_overlap_leaves_cache_unchanged() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cache.json");

        let mut cache = CacheStore::open(&path)?;
        cache.append(record("AUD", "2024-01-01", &[("USD", 0.66)]))?;
        cache.append(record("AUD", "2024-01-02", &[("USD", 0.67)]))?;

        // Every date is cached, so no request ever goes out and the bogus
        // endpoint below is never hit.
        let client =
            RatesClient::with_base_url("test-key".to_string(), "http://127.0.0.1:1".to_string());
        let mut report = RunReport::new();
        let start: NaiveDate = "2024-01-01".parse()?;
        let end: NaiveDate = "2024-01-02".parse()?;
        fetch::fetch_range(
            &client,
            &mut cache,
            "AUD",
            &["USD".to_string()],
            start,
            end,
            &mut report,
        )
        .await?;

        assert_eq!(cache.len(), 2);
        assert_eq!(report.fetched, 0);
        assert_eq!(report.already_cached, 2);
        Ok(())
    }
}
