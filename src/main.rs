mod api;
mod cache;
mod config;
mod db;
mod dim_currency;
mod dim_time;
mod error;
mod fetch;
mod load;
mod models;
mod pipeline;
mod report;
mod transform;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::env;

use api::RatesClient;
use cache::CacheStore;
use report::RunReport;

#[derive(Parser)]
#[command(
    name = "fx-rates-etl",
    about = "Fetch historical FX rates, cache them, and load the warehouse"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch recent rates into the local cache
    Fetch {
        /// Lookback window in days (defaults to config)
        #[arg(long)]
        days: Option<u32>,
    },
    /// One-time fetch of several years of history, in chunks
    Backfill {
        #[arg(long)]
        years: Option<u32>,
        #[arg(long)]
        chunks: Option<u32>,
    },
    /// Transform the cache and load dimensions + facts into the warehouse
    Load,
    /// Fetch then load: the scheduled job
    Run {
        #[arg(long)]
        days: Option<u32>,
    },
    /// List the currency dimension
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    let cfg = config::load_config().unwrap_or_default();
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url.clone());

    match cli.command {
        Command::Fetch { days } => {
            let client = RatesClient::with_base_url(config::api_key()?, cfg.api_base_url.clone());
            let mut cache = CacheStore::open(&cfg.cache_path)?;
            let mut report = RunReport::new();

            let (start, end) = fetch::lookback_window(days.unwrap_or(cfg.fetch_days));
            println!("Fetching {} -> {} (base {})", start, end, cfg.base_currency);
            fetch::fetch_range(
                &client,
                &mut cache,
                &cfg.base_currency,
                &cfg.symbols,
                start,
                end,
                &mut report,
            )
            .await?;

            println!("✅ Cache now holds {} records", cache.len());
            report.print_summary();
        }
        Command::Backfill { years, chunks } => {
            let client = RatesClient::with_base_url(config::api_key()?, cfg.api_base_url.clone());
            let mut cache = CacheStore::open(&cfg.cache_path)?;
            let mut report = RunReport::new();

            fetch::backfill(
                &client,
                &mut cache,
                &cfg.base_currency,
                &cfg.symbols,
                years.unwrap_or(cfg.backfill_years),
                chunks.unwrap_or(cfg.backfill_chunks),
                &mut report,
            )
            .await?;
            report.print_summary();
        }
        Command::Load => {
            let pool = db::create_db_pool(&db_url).await?;
            let mut report = RunReport::new();

            pipeline::load_phase(&cfg, &pool, &mut report).await?;
            pool.close().await;
            report.print_summary();
        }
        Command::Run { days } => {
            let client = RatesClient::with_base_url(config::api_key()?, cfg.api_base_url.clone());
            let pool = db::create_db_pool(&db_url).await?;
            let mut report = RunReport::new();

            let cfg = config::Config {
                fetch_days: days.unwrap_or(cfg.fetch_days),
                ..cfg
            };
            pipeline::run(&cfg, &pool, &client, &mut report).await?;
            pool.close().await;
            report.print_summary();
        }
        Command::Currencies => {
            let pool = db::create_db_pool(&db_url).await?;
            for row in dim_currency::list_currencies(&pool).await? {
                println!(
                    "{:>4}  {}  {}",
                    row.currency_key, row.currency_code, row.currency_name
                );
            }
            pool.close().await;
        }
    }

    Ok(())
}
