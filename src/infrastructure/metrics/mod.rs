//! Prometheus metrics for the notification service.
//!
//! - Webhook request outcomes per provider
//! - Status update results (applied, skipped, error)
//! - Reconciliation latency
//! - Template rendering

mod helpers;

pub use helpers::{encode_metrics, DeliveryMetrics, TemplateMetrics, WebhookMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "desk";

lazy_static! {
    // ============================================================================
    // Webhook Metrics
    // ============================================================================

    /// Inbound webhook requests by provider and outcome
    pub static ref WEBHOOK_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_webhook_requests_total", METRIC_PREFIX),
        "Total inbound webhook requests",
        &["provider", "outcome"]
    ).unwrap();

    // ============================================================================
    // Delivery Status Metrics
    // ============================================================================

    /// Status updates by provider, canonical status and result
    pub static ref STATUS_UPDATES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_status_updates_total", METRIC_PREFIX),
        "Total delivery status updates",
        &["provider", "status", "result"]
    ).unwrap();

    /// Time spent reconciling one callback body
    pub static ref RECONCILE_DURATION: HistogramVec = register_histogram_vec!(
        format!("{}_reconcile_duration_seconds", METRIC_PREFIX),
        "Reconciliation duration per callback in seconds",
        &["provider"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();

    // ============================================================================
    // Template Metrics
    // ============================================================================

    /// Templates rendered for events
    pub static ref TEMPLATES_RENDERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_templates_rendered_total", METRIC_PREFIX),
        "Total templates rendered"
    ).unwrap();

    /// Tokens left unresolved in rendered templates
    pub static ref TEMPLATE_UNRESOLVED_TOKENS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_unresolved_tokens_total", METRIC_PREFIX),
        "Total template tokens left unresolved"
    ).unwrap();

    /// Templates currently held by the store
    pub static ref TEMPLATES_STORED: IntGauge = register_int_gauge!(
        format!("{}_templates_stored", METRIC_PREFIX),
        "Number of stored templates"
    ).unwrap();
}
