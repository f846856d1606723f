//! Table-driven linear unit conversion
//!
//! Every multiplicative category (length, weight, volume, speed, data, time, cooking)
//! is described by one factor per unit relative to the category's base unit.

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{Category, UnitDTO};
use super::ConverterSync;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;

// ============================================================================
// Unit Registry
// ============================================================================

/// Unit definition with its scale factor
#[derive(Debug, Clone)]
pub struct UnitDefinition {
    pub symbol: &'static str,
    pub name: &'static str,
    pub base_factor: f64, // value_in_base = value_in_unit * base_factor
}

fn unit(symbol: &'static str, name: &'static str, base_factor: f64) -> UnitDefinition {
    UnitDefinition { symbol, name, base_factor }
}

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;
const TIB: f64 = GIB * 1024.0;

/// Registry initialized once, units kept in display order
static UNIT_REGISTRY: Lazy<HashMap<Category, Vec<UnitDefinition>>> = Lazy::new(|| {
    let mut registry = HashMap::new();

    // Length (base: meters)
    registry.insert(Category::Length, vec![
        unit("mm", "Millimeters", 0.001),
        unit("cm", "Centimeters", 0.01),
        unit("m", "Meters", 1.0),
        unit("km", "Kilometers", 1000.0),
        unit("inch", "Inches", 0.0254),
        unit("ft", "Feet", 0.3048),
        unit("yd", "Yards", 0.9144),
        unit("mi", "Miles", 1609.344),
    ]);

    // Weight (base: kilograms)
    registry.insert(Category::Weight, vec![
        unit("mg", "Milligrams", 1e-6),
        unit("g", "Grams", 0.001),
        unit("kg", "Kilograms", 1.0),
        unit("oz", "Ounces", 0.028349523125),
        unit("lb", "Pounds", 0.45359237),
    ]);

    // Volume (base: liters)
    registry.insert(Category::Volume, vec![
        unit("ml", "Milliliters", 0.001),
        unit("l", "Liters", 1.0),
        unit("gallon", "Gallons (US)", 3.785411784),
    ]);

    // Speed (base: m/s)
    registry.insert(Category::Speed, vec![
        unit("ms", "Meters/Second", 1.0),
        unit("kmh", "Kilometers/Hour", 1.0 / 3.6),
        unit("mph", "Miles/Hour", 0.44704),
        unit("knot", "Knots", 1852.0 / 3600.0),
    ]);

    // Data (base: bytes). KB..TB keep binary multipliers.
    registry.insert(Category::Data, vec![
        unit("B", "Bytes", 1.0),
        unit("KB", "Kilobytes", KIB),
        unit("MB", "Megabytes", MIB),
        unit("GB", "Gigabytes", GIB),
        unit("TB", "Terabytes", TIB),
        unit("KiB", "Kibibytes", KIB),
        unit("MiB", "Mebibytes", MIB),
        unit("GiB", "Gibibytes", GIB),
        unit("TiB", "Tebibytes", TIB),
    ]);

    // Time (base: seconds)
    registry.insert(Category::Time, vec![
        unit("sec", "Seconds", 1.0),
        unit("min", "Minutes", 60.0),
        unit("hr", "Hours", 3600.0),
        unit("day", "Days", 86_400.0),
        unit("week", "Weeks", 604_800.0),
    ]);

    // Cooking (base: milliliters)
    registry.insert(Category::Cooking, vec![
        unit("tsp", "Teaspoons", 4.92892),
        unit("tbsp", "Tablespoons", 14.7868),
        unit("cup", "Cups", 240.0),
        unit("ml", "Milliliters", 1.0),
    ]);

    registry
});

/// Categories served by the linear converter
pub fn linear_categories() -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| UNIT_REGISTRY.contains_key(c))
        .collect()
}

/// Scale factor of `unit` within `category`, if both are known
pub fn factor_of(category: Category, unit: &str) -> Option<f64> {
    UNIT_REGISTRY
        .get(&category)?
        .iter()
        .find(|def| def.symbol == unit)
        .map(|def| def.base_factor)
}

/// Unit definitions of a linear category in display order
pub fn definitions_of(category: Category) -> &'static [UnitDefinition] {
    UNIT_REGISTRY
        .get(&category)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Convert via the category's base unit
pub fn convert_linear(category: Category, value: f64, from_unit: &str, to_unit: &str) -> AppResult<f64> {
    // Same unit, no arithmetic
    if from_unit == to_unit {
        return Ok(value);
    }

    let from_factor = factor_of(category, from_unit)
        .ok_or_else(|| AppError::InvalidUnit(format!("{} is not a {} unit", from_unit, category)))?;
    let to_factor = factor_of(category, to_unit)
        .ok_or_else(|| AppError::InvalidUnit(format!("{} is not a {} unit", to_unit, category)))?;

    let base_value = value * from_factor;
    let result = base_value / to_factor;

    tracing::trace!(%category, value, from_unit, to_unit, base_value, result, "linear conversion");

    if !result.is_finite() {
        return Err(AppError::InvalidInput(format!(
            "{} {} does not fit in {}",
            value, from_unit, to_unit
        )));
    }
    Ok(result)
}

// ============================================================================
// Converter Implementation
// ============================================================================

#[derive(Clone, Default)]
pub struct LinearConverter;

impl ConverterSync for LinearConverter {
    fn id(&self) -> &str {
        "linear"
    }

    fn handles(&self, category: Category) -> bool {
        UNIT_REGISTRY.contains_key(&category)
    }

    fn units(&self, category: Category) -> Vec<UnitDTO> {
        definitions_of(category)
            .iter()
            .map(|def| UnitDTO {
                id: def.symbol.to_string(),
                label: def.name.to_string(),
                category,
            })
            .collect()
    }
}

#[async_trait]
impl super::ConverterAsync for LinearConverter {
    async fn convert(&self, category: Category, value: f64, from_unit: &str, to_unit: &str) -> AppResult<f64> {
        convert_linear(category, value, from_unit, to_unit)
    }
}
