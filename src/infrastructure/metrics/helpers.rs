//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::delivery::DeliveryStatus;

use super::{
    RECONCILE_DURATION, STATUS_UPDATES_TOTAL, TEMPLATES_RENDERED_TOTAL,
    TEMPLATE_UNRESOLVED_TOKENS_TOTAL, WEBHOOK_REQUESTS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording webhook request outcomes
pub struct WebhookMetrics;

impl WebhookMetrics {
    pub fn record_accepted(provider: &str) {
        WEBHOOK_REQUESTS_TOTAL
            .with_label_values(&[provider, "accepted"])
            .inc();
    }

    pub fn record_unauthorized(provider: &str) {
        WEBHOOK_REQUESTS_TOTAL
            .with_label_values(&[provider, "unauthorized"])
            .inc();
    }

    pub fn record_malformed(provider: &str) {
        WEBHOOK_REQUESTS_TOTAL
            .with_label_values(&[provider, "malformed"])
            .inc();
    }

    pub fn record_oversized(provider: &str) {
        WEBHOOK_REQUESTS_TOTAL
            .with_label_values(&[provider, "oversized"])
            .inc();
    }

    pub fn record_verified(provider: &str) {
        WEBHOOK_REQUESTS_TOTAL
            .with_label_values(&[provider, "verified"])
            .inc();
    }
}

/// Helper struct for recording status update results
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    pub fn record_applied(provider: &str, status: DeliveryStatus) {
        STATUS_UPDATES_TOTAL
            .with_label_values(&[provider, status.as_str(), "applied"])
            .inc();
    }

    pub fn record_skipped(provider: &str, status: DeliveryStatus) {
        STATUS_UPDATES_TOTAL
            .with_label_values(&[provider, status.as_str(), "skipped"])
            .inc();
    }

    pub fn record_error(provider: &str, status: DeliveryStatus) {
        STATUS_UPDATES_TOTAL
            .with_label_values(&[provider, status.as_str(), "error"])
            .inc();
    }

    pub fn observe_reconcile(provider: &str, seconds: f64) {
        RECONCILE_DURATION
            .with_label_values(&[provider])
            .observe(seconds);
    }
}

/// Helper struct for recording template rendering
pub struct TemplateMetrics;

impl TemplateMetrics {
    pub fn record_render(unresolved_tokens: usize) {
        TEMPLATES_RENDERED_TOTAL.inc();
        if unresolved_tokens > 0 {
            TEMPLATE_UNRESOLVED_TOKENS_TOTAL.inc_by(unresolved_tokens as u64);
        }
    }
}
