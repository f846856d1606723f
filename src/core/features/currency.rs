//! Currency converter feature
//!
//! Converts between ISO-style currency codes through the rate cache's base currency.

pub mod fetcher;
pub mod service;
pub mod store;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{Category, UnitDTO};

use self::service::RateCache;
use self::types::RateSnapshot;
use super::{ConverterAsync, ConverterSync};

/// Offered before any snapshot has been fetched
const MAJOR_CURRENCIES: [(&str, &str); 10] = [
    ("USD", "US Dollar"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("JPY", "Japanese Yen"),
    ("AUD", "Australian Dollar"),
    ("CAD", "Canadian Dollar"),
    ("CHF", "Swiss Franc"),
    ("CNY", "Chinese Yuan"),
    ("INR", "Indian Rupee"),
    ("MXN", "Mexican Peso"),
];

#[derive(Clone)]
pub struct CurrencyConverter {
    cache: Arc<RateCache>,
    base: String,
}

impl CurrencyConverter {
    pub fn new(cache: Arc<RateCache>, base: impl Into<String>) -> Self {
        Self {
            cache,
            base: base.into().trim().to_ascii_uppercase(),
        }
    }

    pub async fn convert_currency(&self, value: f64, from: &str, to: &str) -> AppResult<f64> {
        let from = normalize_code(from)?;
        let to = normalize_code(to)?;
        if from == to {
            return Ok(value);
        }

        let snapshot = self.cache.get_rates(&self.base).await?;
        let result = convert_with(&snapshot, value, &from, &to)?;

        tracing::debug!(value, %from, %to, result, base = %snapshot.base, "currency conversion");
        Ok(result)
    }
}

/// Triangulate through the snapshot's base: (value / rate_from) * rate_to
pub fn convert_with(snapshot: &RateSnapshot, value: f64, from: &str, to: &str) -> AppResult<f64> {
    let from_rate = snapshot
        .rate_of(from)
        .ok_or_else(|| AppError::InvalidUnit(format!("Currency not supported: {}", from)))?;
    let to_rate = snapshot
        .rate_of(to)
        .ok_or_else(|| AppError::InvalidUnit(format!("Currency not supported: {}", to)))?;

    let in_base = if from == snapshot.base { value } else { value / from_rate };
    Ok(if to == snapshot.base { in_base } else { in_base * to_rate })
}

fn normalize_code(code: &str) -> AppResult<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(AppError::InvalidUnit(format!("Not a currency code: {}", code)))
    }
}

impl ConverterSync for CurrencyConverter {
    fn id(&self) -> &str {
        "currency"
    }

    fn handles(&self, category: Category) -> bool {
        category == Category::Currency
    }

    fn units(&self, category: Category) -> Vec<UnitDTO> {
        if !self.handles(category) {
            return vec![];
        }
        match self.cache.cached() {
            Some(snapshot) => snapshot
                .codes()
                .into_iter()
                .map(|code| UnitDTO {
                    label: code.clone(),
                    id: code,
                    category,
                })
                .collect(),
            None => MAJOR_CURRENCIES
                .iter()
                .map(|(code, name)| UnitDTO {
                    id: code.to_string(),
                    label: name.to_string(),
                    category,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ConverterAsync for CurrencyConverter {
    async fn convert(&self, _category: Category, value: f64, from_unit: &str, to_unit: &str) -> AppResult<f64> {
        self.convert_currency(value, from_unit, to_unit).await
    }
}
