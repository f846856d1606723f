use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Conversion domains known to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Length,
    Weight,
    #[serde(rename = "temp", alias = "temperature")]
    Temperature,
    Volume,
    Speed,
    Data,
    Time,
    Cooking,
    Currency,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Length,
        Category::Weight,
        Category::Temperature,
        Category::Volume,
        Category::Speed,
        Category::Data,
        Category::Time,
        Category::Cooking,
        Category::Currency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Length => "length",
            Category::Weight => "weight",
            Category::Temperature => "temp",
            Category::Volume => "volume",
            Category::Speed => "speed",
            Category::Data => "data",
            Category::Time => "time",
            Category::Cooking => "cooking",
            Category::Currency => "currency",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "length" => Ok(Category::Length),
            "weight" => Ok(Category::Weight),
            "temp" | "temperature" => Ok(Category::Temperature),
            "volume" => Ok(Category::Volume),
            "speed" => Ok(Category::Speed),
            "data" => Ok(Category::Data),
            "time" => Ok(Category::Time),
            "cooking" => Ok(Category::Cooking),
            "currency" => Ok(Category::Currency),
            _ => Err(AppError::UnknownCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub category: String,
    pub value: f64,
    pub from_unit: String,
    pub to_unit: String,
}

impl ConvertRequest {
    pub fn new(
        category: impl Into<String>,
        value: f64,
        from_unit: impl Into<String>,
        to_unit: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            value,
            from_unit: from_unit.into(),
            to_unit: to_unit.into(),
        }
    }
}

/// Outcome of a single conversion request.
///
/// `result` is `None` whenever `formatted_result` holds a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub result: Option<f64>,
    pub formatted_result: String,
    pub from_unit: String,
    pub to_unit: String,
    pub error: Option<AppErrorSummary>,
}

/// Flattened error carried in responses for the display layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppErrorSummary {
    pub kind: String,
    pub message: String,
}

impl From<&AppError> for AppErrorSummary {
    fn from(err: &AppError) -> Self {
        let kind = match err {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::InvalidUnit(_) => "invalid_unit",
            AppError::UnknownCategory(_) => "unknown_category",
            AppError::UnavailableRates(_) => "unavailable_rates",
            AppError::Network(_) => "network",
            AppError::Storage(_) => "storage",
            AppError::Io(_) => "io",
            AppError::Unknown(_) => "unknown",
        };
        Self {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDTO {
    pub id: String,
    pub label: String,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUnitsResponse {
    pub category: Category,
    pub units: Vec<UnitDTO>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiReport {
    pub bmi: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiReport {
    pub emi: f64,
    pub monthly_rate: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}
