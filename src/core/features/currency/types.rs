use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Exchange rates relative to `base`, as fetched at `fetched_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub base: String,
    pub rates: HashMap<String, f64>,
    pub fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// Rate of `code` relative to the base; the base itself is always 1
    pub fn rate_of(&self, code: &str) -> Option<f64> {
        if code == self.base {
            return Some(1.0);
        }
        self.rates.get(code).copied()
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.fetched_at
    }

    /// Base plus every rate key, sorted
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.rates.keys().cloned().collect();
        if !self.rates.contains_key(&self.base) {
            codes.push(self.base.clone());
        }
        codes.sort();
        codes
    }
}

/// Network payload from the rate service: `{ base, rates: { CODE: number } }`.
///
/// Non-positive or non-numeric rates are dropped rather than failing the whole payload.
#[derive(Debug, Deserialize)]
pub struct RatesApiResponse {
    pub base: String,
    #[serde(deserialize_with = "deserialize_rates")]
    pub rates: HashMap<String, f64>,
}

/// Persisted form of the cache slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    /// epoch millis of the write
    pub ts: i64,
    pub data: RateSnapshot,
}

impl StoredSnapshot {
    pub fn new(data: RateSnapshot) -> Self {
        Self {
            ts: data.fetched_at.timestamp_millis(),
            data,
        }
    }

}

fn deserialize_rates<'de, D>(deserializer: D) -> Result<HashMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(code, value)| {
            let rate = match value {
                Value::Number(num) => num.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }?;
            (rate.is_finite() && rate > 0.0).then(|| (code.trim().to_ascii_uppercase(), rate))
        })
        .collect())
}
