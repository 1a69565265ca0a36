// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{Local, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::EtlError;
use crate::models::RawRateRecord;

pub const DEFAULT_BASE_URL: &str = "https://api.exchangeratesapi.io/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Client for the historical-rates endpoint: one GET per date, rates quoted
/// against a single base currency.
pub struct RatesClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Wire schema of `GET /v1/{date}`. The API flags failures in-band with
/// `success: false` plus an error envelope, so every field is optional and
/// validated here at the fetch boundary.
#[derive(Debug, Deserialize)]
struct HistoricalRatesResponse {
    success: Option<bool>,
    timestamp: Option<i64>,
    base: Option<String>,
    date: Option<NaiveDate>,
    rates: Option<BTreeMap<String, f64>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<i64>,
    #[serde(rename = "type")]
    kind: Option<String>,
    info: Option<String>,
}

impl ApiErrorBody {
    fn describe(&self) -> String {
        format!(
            "code {} ({})",
            self.code.unwrap_or(0),
            self.info
                .as_deref()
                .or(self.kind.as_deref())
                .unwrap_or("no detail")
        )
    }
}

impl RatesClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    /// Fetch the rates for one date. Auth failures (HTTP 401/403 or API
    /// error codes 101/102) are fatal; everything else is a per-date
    /// `Network` failure the caller records and moves past.
    pub async fn get_historical(
        &self,
        date: NaiveDate,
        base: &str,
        symbols: &[String],
    ) -> Result<RawRateRecord, EtlError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), date);
        let symbols_param = symbols.join(",");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_key", self.api_key.as_str()),
                ("base", base),
                ("symbols", symbols_param.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| EtlError::Network {
                date,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EtlError::Auth(format!(
                "API rejected the key with HTTP {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::Network {
                date,
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        let payload: HistoricalRatesResponse =
            response.json().await.map_err(|e| EtlError::Network {
                date,
                reason: format!("invalid JSON payload: {}", e),
            })?;

        if payload.success == Some(false) {
            let detail = payload
                .error
                .as_ref()
                .map(ApiErrorBody::describe)
                .unwrap_or_else(|| "no error detail".to_string());
            // 101 = invalid key, 102 = inactive account
            return match payload.error.as_ref().and_then(|e| e.code) {
                Some(101) | Some(102) => Err(EtlError::Auth(detail)),
                _ => Err(EtlError::Network {
                    date,
                    reason: detail,
                }),
            };
        }

        let rates = payload.rates.filter(|r| !r.is_empty()).ok_or_else(|| {
            EtlError::Network {
                date,
                reason: "response carries no rates".to_string(),
            }
        })?;

        Ok(RawRateRecord {
            base: payload.base.unwrap_or_else(|| base.to_string()),
            date: payload.date.unwrap_or(date),
            rates,
            timestamp: payload.timestamp,
            fetched_at: Local::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_payload() {
        let body = r#"{
            "success": true,
            "timestamp": 1704150000,
            "base": "AUD",
            "date": "2024-01-01",
            "rates": {"USD": 0.66, "EUR": 0.61}
        }"#;
        let payload: HistoricalRatesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(payload.success, Some(true));
        assert_eq!(payload.base.as_deref(), Some("AUD"));
        let rates = payload.rates.unwrap();
        assert_eq!(rates.len(), 2);
        assert!(rates.contains_key("USD"));
    }

    #[test]
    fn test_parse_error_payload() {
        let body = r#"{
            "success": false,
            "error": {"code": 101, "type": "invalid_access_key"}
        }"#;
        let payload: HistoricalRatesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(payload.success, Some(false));
        let error = payload.error.unwrap();
        assert_eq!(error.code, Some(101));
        assert_eq!(error.describe(), "code 101 (invalid_access_key)");
    }
}
