//! Application state management.
//!
//! Each binary serves exactly one service, so the state is generic over it:
//! `AppState<CredentialAuthority>` or `AppState<InventoryLedger>`. The
//! operational handlers (`/health`, `/metrics`) are written once against
//! the `StoreProbe` bound and shared by both routers.

use crate::domain::MetricsPtr;
use std::sync::Arc;

/// Shared application state passed to all Axum handlers.
///
/// Built once at startup and never mutated. Cloned by Axum for every
/// request, which only bumps two reference counts.
pub(crate) struct AppState<S> {
    /// The service this process exposes. It owns the store handle.
    service: Arc<S>,

    /// Metrics implementation for recording application events.
    ///
    /// Either Prometheus-backed (production) or no-op (testing/development).
    metrics: MetricsPtr,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        // ---
        Self {
            service: Arc::clone(&self.service),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<S> AppState<S> {
    // ---
    pub fn new(service: Arc<S>, metrics: MetricsPtr) -> Self {
        // ---
        AppState { service, metrics }
    }

    /// Get a reference to the service.
    pub(crate) fn service(&self) -> &S {
        // ---
        &self.service
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }
}
