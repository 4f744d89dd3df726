//! Evolution gateway status callbacks.
//!
//! ```json
//! { "event": "messages.update",
//!   "data": { "key": { "id": "3EB0..." }, "status": "DELIVERY_ACK" } }
//! ```
//!
//! `data` may also be an array of such objects, and the message ID may be
//! given as `data.keyId` or `data.id` instead of `data.key.id`.

use serde_json::Value;

use super::provider::{non_empty_str, ProviderAdapter, RawCode, RawStatus, RawTimestamp};
use super::status::DeliveryStatus;

/// Events that carry message status changes
const STATUS_EVENTS: [&str; 2] = ["messages.update", "message.status"];

#[derive(Debug, Default, Clone, Copy)]
pub struct EvolutionAdapter;

impl EvolutionAdapter {
    /// `MESSAGES_UPDATE`, `messages-update` and `messages.update` name the same event.
    fn is_status_event(event: &str) -> bool {
        let normalized = event.trim().to_ascii_lowercase().replace(['_', '-'], ".");
        STATUS_EVENTS.contains(&normalized.as_str())
    }

    fn extract_one(data: &Value, envelope: &Value) -> Option<RawStatus> {
        let external_id = non_empty_str(data.pointer("/key/id"))
            .or_else(|| non_empty_str(data.get("keyId")))
            .or_else(|| non_empty_str(data.get("id")))?;

        let code = data
            .get("status")
            .or_else(|| data.pointer("/update/status"))
            .and_then(RawCode::from_value)?;

        let timestamp = ["messageTimestamp", "timestamp"]
            .iter()
            .find_map(|key| data.get(*key).and_then(RawTimestamp::from_value))
            .or_else(|| envelope.get("date_time").and_then(RawTimestamp::from_value));

        Some(RawStatus {
            external_id,
            code,
            timestamp,
            error_message: None,
        })
    }
}

impl ProviderAdapter for EvolutionAdapter {
    fn name(&self) -> &'static str {
        "evolution"
    }

    fn extract(&self, body: &Value) -> Vec<RawStatus> {
        let Some(event) = body.get("event").and_then(Value::as_str) else {
            return Vec::new();
        };
        if !Self::is_status_event(event) {
            tracing::debug!(event = %event, "Ignoring non-status Evolution event");
            return Vec::new();
        }

        match body.get("data") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| Self::extract_one(item, body))
                .collect(),
            Some(data @ Value::Object(_)) => Self::extract_one(data, body).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    fn map_status(&self, code: &RawCode) -> Option<DeliveryStatus> {
        if let Some(n) = code.as_number() {
            return match n {
                3 => Some(DeliveryStatus::Delivered),
                4 => Some(DeliveryStatus::Read),
                _ => None,
            };
        }
        match code.as_text()? {
            "DELIVERY_ACK" => Some(DeliveryStatus::Delivered),
            "READ" | "PLAYED" => Some(DeliveryStatus::Read),
            _ => None,
        }
    }
}
