//! Converter registry with enum dispatch
//!
//! Each category is served by exactly one converter. Sync metadata methods go through
//! `enum_dispatch`; the async `convert` is dispatched by hand because `enum_dispatch`
//! does not support async methods.

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{Category, ConvertRequest, ConvertResponse, AppErrorSummary, GetUnitsResponse, UnitDTO};
use enum_dispatch::enum_dispatch;

pub mod calculator;
pub mod currency;
pub mod temperature;
pub mod unit_converter;

use async_trait::async_trait;

use self::currency::CurrencyConverter;
use self::temperature::TemperatureConverter;
use self::unit_converter::LinearConverter;

/// Sync methods trait for enum_dispatch
#[enum_dispatch]
pub trait ConverterSync: Send + Sync {
    /// Unique identifier for this converter
    fn id(&self) -> &str;

    /// Whether this converter serves `category`
    fn handles(&self, category: Category) -> bool;

    /// Units selectable for `category`, in display order
    fn units(&self, category: Category) -> Vec<UnitDTO>;
}

/// Async methods trait (separate from enum_dispatch)
#[async_trait]
pub trait ConverterAsync: Send + Sync {
    async fn convert(&self, category: Category, value: f64, from_unit: &str, to_unit: &str) -> AppResult<f64>;
}

#[enum_dispatch(ConverterSync)]
pub enum AppConverter {
    Linear(LinearConverter),
    Temperature(TemperatureConverter),
    Currency(CurrencyConverter),
}

impl AppConverter {
    async fn convert(&self, category: Category, value: f64, from_unit: &str, to_unit: &str) -> AppResult<f64> {
        match self {
            AppConverter::Linear(c) => c.convert(category, value, from_unit, to_unit).await,
            AppConverter::Temperature(c) => c.convert(category, value, from_unit, to_unit).await,
            AppConverter::Currency(c) => c.convert(category, value, from_unit, to_unit).await,
        }
    }
}

/// Routes `(category, value, from, to)` to the converter serving the category
pub struct ConversionDispatcher {
    converters: Vec<AppConverter>,
}

impl ConversionDispatcher {
    pub fn new(currency: CurrencyConverter) -> Self {
        Self {
            converters: vec![
                AppConverter::Temperature(TemperatureConverter),
                AppConverter::Currency(currency),
                AppConverter::Linear(LinearConverter),
            ],
        }
    }

    fn route(&self, category: Category) -> AppResult<&AppConverter> {
        self.converters
            .iter()
            .find(|c| c.handles(category))
            .ok_or_else(|| AppError::UnknownCategory(category.to_string()))
    }

    pub async fn convert(&self, category: &str, value: f64, from_unit: &str, to_unit: &str) -> AppResult<f64> {
        if !value.is_finite() {
            return Err(AppError::InvalidInput(format!("{} is not a finite number", value)));
        }
        let category: Category = category.parse()?;
        let converter = self.route(category)?;
        tracing::trace!(%category, converter = converter.id(), "routing conversion");
        let result = converter.convert(category, value, from_unit, to_unit).await?;
        if !result.is_finite() {
            return Err(AppError::InvalidInput(format!("{} {} is out of range in {}", value, from_unit, to_unit)));
        }
        Ok(result)
    }

    pub fn units_of(&self, category: &str) -> AppResult<GetUnitsResponse> {
        let category: Category = category.parse()?;
        let units = self.route(category)?.units(category);
        Ok(GetUnitsResponse { category, units })
    }

    /// Request boundary: never fails, renders a placeholder instead
    pub async fn handle(&self, request: ConvertRequest) -> ConvertResponse {
        let outcome = self
            .convert(&request.category, request.value, &request.from_unit, &request.to_unit)
            .await;

        match outcome {
            Ok(result) => ConvertResponse {
                result: Some(result),
                formatted_result: format_result(result, &request.to_unit),
                from_unit: request.from_unit,
                to_unit: request.to_unit,
                error: None,
            },
            Err(e) => {
                if e.is_request_error() || matches!(e, AppError::UnavailableRates(_)) {
                    tracing::warn!(category = %request.category, error = %e, "conversion rejected");
                } else {
                    tracing::error!(category = %request.category, error = %e, "conversion failed");
                }
                ConvertResponse {
                    result: None,
                    formatted_result: e.placeholder().to_string(),
                    from_unit: request.from_unit,
                    to_unit: request.to_unit,
                    error: Some(AppErrorSummary::from(&e)),
                }
            }
        }
    }
}

/// Fixed two-decimal display followed by the unit id
pub fn format_result(value: f64, unit: &str) -> String {
    format!("{:.2} {}", value, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::currency::service::test_support::*;
    use super::currency::service::RateCache;
    use super::currency::store::MemorySnapshotStore;
    use std::sync::Arc;

    fn dispatcher(fetcher: Arc<StubFetcher>) -> ConversionDispatcher {
        let cache = RateCache::new(
            fetcher,
            Arc::new(MemorySnapshotStore::default()),
            Arc::new(ManualClock::new(start())),
            chrono::Duration::hours(12),
        );
        ConversionDispatcher::new(CurrencyConverter::new(Arc::new(cache), "USD"))
    }

    #[tokio::test]
    async fn test_routes_each_kind() {
        let d = dispatcher(Arc::new(StubFetcher::new(&[("EUR", 0.5)])));

        assert_eq!(d.convert("length", 1.0, "km", "m").await.unwrap(), 1000.0);
        assert_eq!(d.convert("temp", 100.0, "C", "F").await.unwrap(), 212.0);
        assert_eq!(d.convert("temperature", 0.0, "C", "K").await.unwrap(), 273.15);
        assert_eq!(d.convert("currency", 10.0, "USD", "EUR").await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn test_non_finite_rejected_before_routing() {
        let d = dispatcher(Arc::new(StubFetcher::offline()));

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                d.convert("nonsense", value, "a", "b").await,
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let d = dispatcher(Arc::new(StubFetcher::offline()));

        assert!(matches!(
            d.convert("luminosity", 1.0, "lm", "cd").await,
            Err(AppError::UnknownCategory(_))
        ));
        assert!(d.units_of("luminosity").is_err());
    }

    #[tokio::test]
    async fn test_every_category_has_units() {
        let d = dispatcher(Arc::new(StubFetcher::offline()));

        for category in Category::ALL {
            let response = d.units_of(category.as_str()).unwrap();
            assert_eq!(response.category, category);
            assert!(!response.units.is_empty(), "{} has no units", category);
        }
    }

    #[tokio::test]
    async fn test_handle_formats_result() {
        let d = dispatcher(Arc::new(StubFetcher::offline()));

        let response = d.handle(ConvertRequest::new("weight", 2500.0, "g", "kg")).await;
        assert!((response.result.unwrap() - 2.5).abs() < 1e-12);
        assert_eq!(response.formatted_result, "2.50 kg");
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_handle_renders_placeholders() {
        let d = dispatcher(Arc::new(StubFetcher::offline()));

        let invalid = d.handle(ConvertRequest::new("length", f64::NAN, "m", "km")).await;
        assert_eq!(invalid.formatted_result, "");
        assert_eq!(invalid.error.unwrap().kind, "invalid_input");

        let bad_unit = d.handle(ConvertRequest::new("length", 1.0, "m", "league")).await;
        assert_eq!(bad_unit.formatted_result, "");
        assert_eq!(bad_unit.error.unwrap().kind, "invalid_unit");

        let offline = d.handle(ConvertRequest::new("currency", 1.0, "USD", "EUR")).await;
        assert_eq!(offline.result, None);
        assert_eq!(offline.formatted_result, "—");
        assert_eq!(offline.error.unwrap().kind, "unavailable_rates");
    }

    #[tokio::test]
    async fn test_overflow_renders_placeholder() {
        let d = dispatcher(Arc::new(StubFetcher::offline()));

        let length = d.handle(ConvertRequest::new("length", 1e308, "mi", "mm")).await;
        assert_eq!(length.result, None);
        assert_eq!(length.formatted_result, "");
        assert_eq!(length.error.unwrap().kind, "invalid_input");

        let temp = d.handle(ConvertRequest::new("temp", 1e308, "C", "F")).await;
        assert_eq!(temp.formatted_result, "");
        assert_eq!(temp.error.unwrap().kind, "invalid_input");
    }

    #[test]
    fn test_format_result() {
        assert_eq!(format_result(0.126, "kg"), "0.13 kg");
        assert_eq!(format_result(-3.0, "C"), "-3.00 C");
    }
}
