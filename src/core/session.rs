//! Per-field input coalescing
//!
//! Rapid edits to one field are debounced so only the last value is converted, and every
//! submission carries a sequence number so a slow conversion that resolves after a newer
//! one can never overwrite the displayed result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::features::ConversionDispatcher;
use crate::shared::types::{ConvertRequest, ConvertResponse};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Issues monotonically increasing sequence numbers per field
pub struct InputCoalescer {
    window: Duration,
    latest: Mutex<HashMap<String, u64>>,
}

impl InputCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            latest: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, field: &str) -> u64 {
        let mut latest = match self.latest.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let seq = latest.entry(field.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    pub fn is_latest(&self, field: &str, seq: u64) -> bool {
        let latest = match self.latest.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        latest.get(field).copied() == Some(seq)
    }

    /// Register an edit and wait out the quiescence window.
    ///
    /// Returns `None` if a newer edit to the same field arrived meanwhile.
    pub async fn settle(&self, field: &str) -> Option<u64> {
        let seq = self.issue(field);
        tokio::time::sleep(self.window).await;
        self.is_latest(field, seq).then_some(seq)
    }
}

impl Default for InputCoalescer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

/// Debounced conversions for a set of named input fields
pub struct FieldSession {
    coalescer: InputCoalescer,
    dispatcher: Arc<ConversionDispatcher>,
    display: Mutex<HashMap<String, ConvertResponse>>,
}

impl FieldSession {
    pub fn new(dispatcher: Arc<ConversionDispatcher>, window: Duration) -> Self {
        Self {
            coalescer: InputCoalescer::new(window),
            dispatcher,
            display: Mutex::new(HashMap::new()),
        }
    }

    /// Convert `request` for `field` unless a newer edit supersedes it.
    ///
    /// Returns the response only when it was applied to the display.
    pub async fn submit(&self, field: &str, request: ConvertRequest) -> Option<ConvertResponse> {
        let Some(seq) = self.coalescer.settle(field).await else {
            tracing::trace!(field, "edit superseded during debounce");
            return None;
        };

        let response = self.dispatcher.handle(request).await;

        if !self.coalescer.is_latest(field, seq) {
            tracing::debug!(field, seq, "discarding stale conversion result");
            return None;
        }

        let mut display = match self.display.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        display.insert(field.to_string(), response.clone());
        Some(response)
    }

    /// Last response applied to `field`
    pub fn display(&self, field: &str) -> Option<ConvertResponse> {
        let display = match self.display.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        display.get(field).cloned()
    }
}
