//! Unit Converter Pro
//!
//! Converts values between units of length, weight, temperature, volume, speed, data
//! size, time, cooking volume and currency, and computes BMI and EMI.

pub mod core;
pub mod shared;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::core::features::currency::fetcher::HttpRateFetcher;
use crate::core::features::currency::service::{RateCache, SystemClock};
use crate::core::features::currency::store::{MemorySnapshotStore, RedbSnapshotStore, SnapshotStore};
use crate::core::features::currency::CurrencyConverter;
use crate::core::{ConversionDispatcher, FieldSession};
use crate::shared::settings::AppSettings;
use crate::shared::AppResult;

/// Everything a front end needs, wired from settings
pub struct AppContext {
    pub settings: AppSettings,
    pub cache: Arc<RateCache>,
    pub dispatcher: Arc<ConversionDispatcher>,
}

impl AppContext {
    /// Wire the engine against the on-disk snapshot store
    pub fn build(settings: AppSettings) -> AppResult<Self> {
        let store: Arc<dyn SnapshotStore> = match RedbSnapshotStore::default_path()
            .and_then(|path| RedbSnapshotStore::open(&path))
        {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!(error = %e, "rate snapshot will not persist across runs");
                Arc::new(MemorySnapshotStore::default())
            }
        };
        Self::build_with_store(settings, store)
    }

    pub fn build_with_store(settings: AppSettings, store: Arc<dyn SnapshotStore>) -> AppResult<Self> {
        let fetcher = HttpRateFetcher::new(
            settings.currency.rate_service_url.clone(),
            Duration::from_secs(settings.currency.request_timeout_secs),
        )?;
        let cache = Arc::new(RateCache::new(
            Arc::new(fetcher),
            store,
            Arc::new(SystemClock),
            settings.freshness()?,
        ));
        let currency = CurrencyConverter::new(Arc::clone(&cache), settings.currency.base_currency.clone());
        let dispatcher = Arc::new(ConversionDispatcher::new(currency));

        Ok(Self {
            settings,
            cache,
            dispatcher,
        })
    }

    pub fn field_session(&self) -> FieldSession {
        FieldSession::new(Arc::clone(&self.dispatcher), self.settings.debounce())
    }
}

/// Install the stderr subscriber, honouring `RUST_LOG`
pub fn init_tracing() -> AppResult<()> {
    let directive = "unit_converter_pro=info"
        .parse::<Directive>()
        .map_err(|e| crate::shared::AppError::Unknown(format!("Invalid log directive: {}", e)))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| crate::shared::AppError::Unknown(format!("Failed to install logger: {}", e)))
}
