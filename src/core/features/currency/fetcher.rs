use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::shared::error::{AppError, AppResult};

use super::types::RatesApiResponse;

/// Source of exchange rates for a base currency
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self, base: &str) -> AppResult<RatesApiResponse>;
}

/// Fetches `GET <endpoint>?base=<code>` from a JSON rate service
pub struct HttpRateFetcher {
    http: Client,
    endpoint: String,
}

impl HttpRateFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("unit-converter-pro/currency")
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RateFetcher for HttpRateFetcher {
    async fn fetch(&self, base: &str) -> AppResult<RatesApiResponse> {
        tracing::debug!(endpoint = %self.endpoint, base, "fetching exchange rates");
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("base", base)])
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AppError::Network(format!(
                "Failed to fetch rates: {}",
                resp.status()
            )));
        }

        let mut payload: RatesApiResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Network(format!("Invalid response: {}", e)))?;

        payload.base = payload.base.trim().to_ascii_uppercase();
        if payload.base.is_empty() || payload.rates.is_empty() {
            return Err(AppError::Network("Rate service returned no usable rates".into()));
        }

        Ok(payload)
    }
}
