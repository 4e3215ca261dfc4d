//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction, and to the
//! background delivery loop.
//!
//! Every collaborator is injected behind a trait object so tests can swap
//! in the in-memory store, the recording transport and a fixed clock.

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::generator::{ContentGenerator, DisabledGenerator};
use crate::store::ActivityStore;
use crate::transport::NotificationTransport;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
///
/// All fields are `Arc`s, so cloning is O(1).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ActivityStore>,
    pub transport: Arc<dyn NotificationTransport>,
    pub generator: Arc<dyn ContentGenerator>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AppConfig>,
    /// Renders `/metrics`; absent when no recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state with the system clock, no generator and no metrics
    pub fn new(
        store: Arc<dyn ActivityStore>,
        transport: Arc<dyn NotificationTransport>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            transport,
            generator: Arc::new(DisabledGenerator),
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
            metrics: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    #[inline]
    pub fn store(&self) -> &dyn ActivityStore {
        self.store.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::transport::RecordingTransport;

    #[tokio::test]
    async fn test_state_clone_shares_store() {
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingTransport::new()),
            AppConfig::default(),
        );
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.store, &cloned.store));
        assert!(cloned.store().health_check().await.is_ok());
    }
}
