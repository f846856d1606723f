use serde::{Deserialize, Serialize};
use tokio::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;

use crate::shared::error::{AppError, AppResult};

/// Environment variable that points at an alternative settings file
pub const SETTINGS_PATH_ENV: &str = "UNIT_CONVERTER_PRO_SETTINGS";

/// Upper bound for `freshness_hours` (one year)
pub const MAX_FRESHNESS_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub currency: CurrencySettings,
    pub preferences: UserPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencySettings {
    pub rate_service_url: String,
    pub base_currency: String,
    pub freshness_hours: i64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub debounce_ms: u64,
    pub default_currency_from: String,
    pub default_currency_to: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            currency: CurrencySettings::default(),
            preferences: UserPreferences::default(),
        }
    }
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            rate_service_url: "https://api.frankfurter.app/latest".to_string(),
            base_currency: "USD".to_string(),
            freshness_hours: 12,
            request_timeout_secs: 10,
        }
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            default_currency_from: "USD".to_string(),
            default_currency_to: "EUR".to_string(),
        }
    }
}

impl UserPreferences {
    /// Fill a missing side of a currency pair from the configured defaults
    pub fn currency_pair<'a>(&'a self, from: Option<&'a str>, to: Option<&'a str>) -> (&'a str, &'a str) {
        (
            from.unwrap_or(self.default_currency_from.as_str()),
            to.unwrap_or(self.default_currency_to.as_str()),
        )
    }
}

impl AppSettings {
    pub fn get_settings_path() -> AppResult<PathBuf> {
        if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        ProjectDirs::from("com", "antigravity", "unit-converter-pro")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| AppError::Io("Failed to determine config directory".to_string()))
    }

    pub async fn load() -> AppResult<Self> {
        let path = Self::get_settings_path()?;
        Self::load_from(&path).await
    }

    /// Load settings from `path`, writing the defaults there first if the file is missing
    pub async fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(path).await?;
            tracing::info!(path = %path.display(), "wrote default settings");
            return Ok(settings);
        }

        let content = fs::read_to_string(path).await
            .map_err(|e| AppError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> AppResult<()> {
        let hours = self.currency.freshness_hours;
        if hours <= 0 || hours > MAX_FRESHNESS_HOURS {
            return Err(AppError::InvalidInput(format!(
                "freshness_hours must be between 1 and {}, got {}",
                MAX_FRESHNESS_HOURS, hours
            )));
        }
        Ok(())
    }

    pub async fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await
                .map_err(|e| AppError::Io(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;

        fs::write(path, content).await
            .map_err(|e| AppError::Io(format!("Failed to write settings file: {}", e)))
    }

    pub fn freshness(&self) -> AppResult<chrono::Duration> {
        self.validate()?;
        chrono::Duration::try_hours(self.currency.freshness_hours).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "freshness_hours out of range: {}",
                self.currency.freshness_hours
            ))
        })
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.preferences.debounce_ms)
    }
}
