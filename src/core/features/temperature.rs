//! Temperature conversion
//!
//! Celsius, Fahrenheit and Kelvin differ by an offset as well as a scale, so they
//! bypass the linear registry and pivot through Celsius instead.

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{Category, UnitDTO};
use super::{ConverterAsync, ConverterSync};
use async_trait::async_trait;

const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub const ALL: [TemperatureUnit; 3] = [
        TemperatureUnit::Celsius,
        TemperatureUnit::Fahrenheit,
        TemperatureUnit::Kelvin,
    ];

    pub fn parse(unit: &str) -> AppResult<Self> {
        match unit.trim() {
            "C" | "c" | "°C" | "celsius" => Ok(TemperatureUnit::Celsius),
            "F" | "f" | "°F" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            "K" | "k" | "kelvin" => Ok(TemperatureUnit::Kelvin),
            _ => Err(AppError::InvalidUnit(format!("Unknown temperature unit: {}", unit))),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
            TemperatureUnit::Kelvin => "K",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "Celsius",
            TemperatureUnit::Fahrenheit => "Fahrenheit",
            TemperatureUnit::Kelvin => "Kelvin",
        }
    }

    fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            TemperatureUnit::Kelvin => value - KELVIN_OFFSET,
        }
    }

    fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => (celsius * 9.0 / 5.0) + 32.0,
            TemperatureUnit::Kelvin => celsius + KELVIN_OFFSET,
        }
    }
}

/// Convert between C, F and K.
///
/// Values below absolute zero are passed through unchanged; callers validate if they care.
pub fn convert_temperature(value: f64, from_unit: &str, to_unit: &str) -> AppResult<f64> {
    let from = TemperatureUnit::parse(from_unit)?;
    let to = TemperatureUnit::parse(to_unit)?;
    if from == to {
        return Ok(value);
    }
    Ok(to.from_celsius(from.to_celsius(value)))
}

#[derive(Clone, Default)]
pub struct TemperatureConverter;

impl ConverterSync for TemperatureConverter {
    fn id(&self) -> &str {
        "temperature"
    }

    fn handles(&self, category: Category) -> bool {
        category == Category::Temperature
    }

    fn units(&self, category: Category) -> Vec<UnitDTO> {
        if !self.handles(category) {
            return vec![];
        }
        TemperatureUnit::ALL
            .iter()
            .map(|u| UnitDTO {
                id: u.symbol().to_string(),
                label: u.name().to_string(),
                category,
            })
            .collect()
    }
}

#[async_trait]
impl ConverterAsync for TemperatureConverter {
    async fn convert(&self, _category: Category, value: f64, from_unit: &str, to_unit: &str) -> AppResult<f64> {
        convert_temperature(value, from_unit, to_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_points() {
        assert_eq!(convert_temperature(0.0, "C", "F").unwrap(), 32.0);
        assert_eq!(convert_temperature(100.0, "C", "F").unwrap(), 212.0);
        assert_eq!(convert_temperature(0.0, "C", "K").unwrap(), 273.15);
        assert_eq!(convert_temperature(-40.0, "F", "C").unwrap(), -40.0);
    }

    #[test]
    fn test_fahrenheit_to_kelvin() {
        let k = convert_temperature(212.0, "F", "K").unwrap();
        assert!((k - 373.15).abs() < 1e-9);
    }

    #[test]
    fn test_identity() {
        assert_eq!(convert_temperature(-12.34, "K", "K").unwrap(), -12.34);
    }

    #[test]
    fn test_negative_kelvin_passes_through() {
        let c = convert_temperature(-10.0, "K", "C").unwrap();
        assert!((c - (-283.15)).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_unit() {
        assert!(matches!(
            convert_temperature(1.0, "R", "C"),
            Err(AppError::InvalidUnit(_))
        ));
    }

    #[test]
    fn test_units_listing() {
        let ids: Vec<String> = TemperatureConverter
            .units(Category::Temperature)
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["C", "F", "K"]);
    }
}
