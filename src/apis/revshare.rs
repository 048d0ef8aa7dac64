/// RevShare statistics client
///
/// Read-through access to the external revenue-share API: distribution
/// history, reward totals and the overview aggregates. Every request
/// carries a cache-busting query parameter and no-cache headers because
/// the upstream sits behind an aggressive CDN.
use crate::errors::ChainError;
use crate::global::read_configs;
use crate::logger::{self, LogTag};
use crate::rpc::RpcClient;
use chrono::{Duration as ChronoDuration, NaiveDateTime, Utc};
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Upstream timestamps run one hour ahead of the displayed feed; every
/// parsed date is shifted back before formatting.
const UPSTREAM_CLOCK_SKEW_HOURS: i64 = 1;

/// Total token supply at genesis (1 billion)
const TOTAL_SUPPLY: f64 = 1_000_000_000.0;

/// One mapped distribution event
#[derive(Debug, Clone, Serialize)]
pub struct DistributionEntry {
    pub id: String,
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "amountDistributed")]
    pub amount_distributed: f64,
    pub status: String,
}

/// Overview aggregates
#[derive(Debug, Clone, Serialize)]
pub struct OverviewData {
    #[serde(rename = "tokensBurned")]
    pub tokens_burned: f64,
    #[serde(rename = "circulatingSupply")]
    pub circulating_supply: f64,
    #[serde(rename = "rewardsDistributed")]
    pub rewards_distributed: f64,
    #[serde(rename = "totalDistributions")]
    pub total_distributions: usize,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

/// Reward totals extracted from whichever endpoint answered
#[derive(Debug, Clone, Serialize)]
pub struct RewardsData {
    #[serde(rename = "totalSolDistributed")]
    pub total_sol_distributed: f64,
    #[serde(rename = "totalDistributions")]
    pub total_distributions: usize,
    #[serde(rename = "minimumRequired")]
    pub minimum_required: f64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    #[serde(rename = "dataSource")]
    pub data_source: String,
}

pub struct RevShareClient {
    client: reqwest::Client,
    base_url: String,
    token_address: String,
}

impl RevShareClient {
    pub fn new(base_url: String, token_address: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token_address,
        }
    }

    pub fn from_config() -> Result<Self, ChainError> {
        let configs = read_configs().map_err(ChainError::ConfigError)?;
        Ok(Self::new(
            configs.revshare_base_url,
            configs.revshare_token_address,
        ))
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, ChainError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("User-Agent", "Mozilla/5.0 (compatible; DataExtractor/1.0)")
            .header("Cache-Control", "no-cache, no-store, must-revalidate")
            .header("Pragma", "no-cache")
            .header("Expires", "0")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::ApiError(format!(
                "RevShare endpoint returned {}",
                status
            )));
        }
        Ok(response.json().await?)
    }

    fn distributions_url(&self) -> String {
        format!(
            "{}/api/token/{}/distributions?t={}",
            self.base_url,
            self.token_address,
            Utc::now().timestamp_millis()
        )
    }

    /// Distribution history, newest first. Err when the upstream has no
    /// usable data yet.
    pub async fn distributions(&self) -> Result<Vec<DistributionEntry>, ChainError> {
        let url = self.distributions_url();
        logger::debug(LogTag::Api, &format!("Fetching distributions: {}", url));

        let data = self.fetch_json(&url).await?;
        let items = data
            .as_array()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ChainError::ApiError("No distributions data available".to_string()))?;

        Ok(map_distributions(items))
    }

    /// Overview aggregates: supply from the chain, reward totals from the
    /// distribution feed. Either source failing degrades to zeros rather
    /// than failing the endpoint.
    pub async fn overview(&self, rpc: &RpcClient) -> OverviewData {
        let circulating_supply = match rpc.get_token_supply(&self.token_address).await {
            Ok(supply) => supply,
            Err(e) => {
                logger::warning(LogTag::Api, &format!("Token supply fetch failed: {}", e));
                0.0
            }
        };

        let (rewards_distributed, total_distributions) =
            match self.fetch_json(&self.distributions_url()).await {
                Ok(data) => match data.as_array() {
                    Some(items) => (
                        items.iter().map(|item| parse_amount(item)).sum(),
                        items.len(),
                    ),
                    None => (0.0, 0),
                },
                Err(e) => {
                    logger::warning(LogTag::Api, &format!("Distributions fetch failed: {}", e));
                    (0.0, 0)
                }
            };

        OverviewData {
            tokens_burned: TOTAL_SUPPLY - circulating_supply,
            circulating_supply,
            rewards_distributed,
            total_distributions,
            last_updated: Utc::now().to_rfc3339(),
        }
    }

    /// Reward totals, swept from several endpoints until one yields data
    pub async fn rewards(&self) -> Result<RewardsData, ChainError> {
        let cache_buster = Utc::now().timestamp_millis();
        let endpoints = [
            format!("{}/api/token/{}?t={}", self.base_url, self.token_address, cache_buster),
            format!(
                "{}/api/token-data/{}?t={}",
                self.base_url, self.token_address, cache_buster
            ),
            format!(
                "{}/api/token/{}/distributions?t={}",
                self.base_url, self.token_address, cache_buster
            ),
        ];

        let mut minimum_required = 0.0;
        let mut total_sol_distributed = 0.0;
        let mut total_distributions = 0;
        let mut found_real_data = false;

        for endpoint in &endpoints {
            let data = match self.fetch_json(endpoint).await {
                Ok(data) => data,
                Err(e) => {
                    logger::debug(LogTag::Api, &format!("Endpoint {} failed: {}", endpoint, e));
                    continue;
                }
            };

            if let Some(min_holding) = data.get("min_holding").and_then(|v| v.as_f64()) {
                minimum_required = min_holding;
                found_real_data = true;
            }

            if let Some(items) = data.as_array() {
                if !items.is_empty() {
                    total_distributions = items.len();
                    total_sol_distributed = items.iter().map(|item| parse_amount(item)).sum();
                    found_real_data = true;
                }
            }
        }

        if !found_real_data || total_sol_distributed <= 0.0 || total_distributions == 0 {
            return Err(ChainError::ApiError(
                "No distribution data available yet".to_string(),
            ));
        }

        Ok(RewardsData {
            total_sol_distributed: (total_sol_distributed * 10_000.0).round() / 10_000.0,
            total_distributions,
            minimum_required,
            last_updated: Utc::now().to_rfc3339(),
            data_source: "RevShare API".to_string(),
        })
    }
}

/// Distributed amount of one raw item, whichever field it arrived in
fn parse_amount(item: &serde_json::Value) -> f64 {
    for key in ["distributed", "amount"] {
        if let Some(value) = item.get(key) {
            if let Some(number) = value.as_f64() {
                return number;
            }
            if let Some(parsed) = value.as_str().and_then(|s| s.parse::<f64>().ok()) {
                return parsed;
            }
        }
    }
    0.0
}

/// Timestamp of one raw item, from whichever field is populated
fn parse_timestamp(item: &serde_json::Value) -> Option<NaiveDateTime> {
    for key in ["date_added", "timestamp", "date"] {
        if let Some(raw) = item.get(key).and_then(|v| v.as_str()) {
            let normalized = raw.replace('T', " ");
            let trimmed = normalized
                .split('.')
                .next()
                .unwrap_or(&normalized)
                .trim_end_matches('Z')
                .trim();
            if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
                return Some(parsed);
            }
        }
    }
    None
}

/// Map raw upstream items to display entries: apply the clock-skew shift,
/// then sort newest first.
pub fn map_distributions(items: &[serde_json::Value]) -> Vec<DistributionEntry> {
    let mut entries: Vec<(Option<NaiveDateTime>, DistributionEntry)> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let parsed = parse_timestamp(item);
            let shifted = parsed.map(|dt| dt - ChronoDuration::hours(UPSTREAM_CLOCK_SKEW_HOURS));
            let date_time = shifted
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();

            let id = item
                .get("id")
                .map(|v| match v.as_str() {
                    Some(s) => s.to_string(),
                    None => v.to_string(),
                })
                .unwrap_or_else(|| format!("dist_{}", index));

            let entry = DistributionEntry {
                id,
                date_time,
                amount_distributed: parse_amount(item),
                status: item
                    .get("status")
                    .and_then(|s| s.as_str())
                    .unwrap_or("Complete")
                    .to_string(),
            };
            (parsed, entry)
        })
        .collect();

    entries.sort_by(|a, b| b.0.cmp(&a.0));
    entries.into_iter().map(|(_, entry)| entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distributions_sorted_newest_first_with_skew_applied() {
        let items = vec![
            serde_json::json!({"distributed": "1.5", "date_added": "2025-09-27 21:42:02"}),
            serde_json::json!({"distributed": "2.25", "date_added": "2025-09-26 10:00:00"}),
        ];

        let mapped = map_distributions(&items);
        assert_eq!(mapped.len(), 2);
        // Newest first: the 09-27 event leads
        assert_eq!(mapped[0].amount_distributed, 1.5);
        assert_eq!(mapped[1].amount_distributed, 2.25);
        // One hour subtracted from each parsed date
        assert_eq!(mapped[0].date_time, "2025-09-27 20:42:02");
        assert_eq!(mapped[1].date_time, "2025-09-26 09:00:00");
    }

    #[test]
    fn test_amounts_parse_from_strings_and_numbers() {
        assert_eq!(parse_amount(&serde_json::json!({"distributed": "1.5"})), 1.5);
        assert_eq!(parse_amount(&serde_json::json!({"distributed": 2.25})), 2.25);
        assert_eq!(parse_amount(&serde_json::json!({"amount": "0.75"})), 0.75);
        assert_eq!(parse_amount(&serde_json::json!({"other": 1})), 0.0);
    }

    #[test]
    fn test_iso_timestamps_accepted() {
        let item = serde_json::json!({"distributed": "1.0", "timestamp": "2025-09-27T21:42:02Z"});
        let parsed = parse_timestamp(&item).unwrap();
        assert_eq!(parsed.format("%H:%M:%S").to_string(), "21:42:02");
    }

    #[test]
    fn test_missing_id_gets_positional_fallback() {
        let items = vec![
            serde_json::json!({"distributed": "1.0", "date_added": "2025-09-27 21:42:02"}),
        ];
        let mapped = map_distributions(&items);
        assert_eq!(mapped[0].id, "dist_0");
        assert_eq!(mapped[0].status, "Complete");
    }
}
