use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::rates_client::DEFAULT_BASE_URL;
use crate::error::EtlError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub base_currency: String,
    pub symbols: Vec<String>,
    pub cache_path: String,
    pub seed_path: String,
    pub database_url: String,
    pub api_base_url: String,
    pub fetch_days: u32,
    pub backfill_years: u32,
    pub backfill_chunks: u32,
}

impl Default for Config {
    fn default() -> Self {
        // Try to read from config.toml first
        if let Ok(config) = load_config() {
            return config;
        }

        // Fallback to hardcoded defaults
        Self {
            base_currency: "AUD".to_string(),
            symbols: vec![
                "EUR".to_string(),
                "USD".to_string(),
                "GBP".to_string(),
                "SGD".to_string(),
            ],
            cache_path: "data/historical_exchange_rates.json".to_string(),
            seed_path: "data/currencies.csv".to_string(),
            database_url: "sqlite://exchange_rates.db".to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            fetch_days: 1,
            backfill_years: 10,
            backfill_chunks: 5,
        }
    }
}

fn get_config_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("config.toml");
    path
}

pub fn load_config() -> anyhow::Result<Config> {
    let config_path = get_config_path();
    let config_str = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let config_path = get_config_path();
    let config_str = toml::to_string_pretty(config)?;
    fs::write(config_path, config_str)?;
    Ok(())
}

/// The API key, from the environment (`.env` is loaded in main). A missing
/// or blank key aborts the run before anything is fetched or written.
pub fn api_key() -> anyhow::Result<String> {
    match std::env::var("EXCHANGE_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(EtlError::Auth("EXCHANGE_API_KEY is not set in environment or .env".to_string()).into()),
    }
}
