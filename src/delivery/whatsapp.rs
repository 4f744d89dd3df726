//! WhatsApp Cloud API status callbacks.
//!
//! ```json
//! { "entry": [ { "changes": [ { "value": { "statuses": [
//!     { "id": "wamid...", "status": "delivered", "timestamp": "1700000000" }
//! ] } } ] } ] }
//! ```

use serde_json::Value;

use super::provider::{non_empty_str, ProviderAdapter, RawCode, RawStatus, RawTimestamp};
use super::status::DeliveryStatus;

const DEFAULT_FAILURE_MESSAGE: &str = "Delivery failed";

#[derive(Debug, Default, Clone, Copy)]
pub struct WhatsAppCloudAdapter;

impl WhatsAppCloudAdapter {
    fn error_message(status: &Value) -> Option<String> {
        let error = status.get("errors")?.as_array()?.first()?;
        non_empty_str(error.pointer("/error_data/details"))
            .or_else(|| non_empty_str(error.get("message")))
            .or_else(|| non_empty_str(error.get("title")))
    }
}

impl ProviderAdapter for WhatsAppCloudAdapter {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    fn extract(&self, body: &Value) -> Vec<RawStatus> {
        let empty = Vec::new();
        let entries = body.get("entry").and_then(Value::as_array).unwrap_or(&empty);

        entries
            .iter()
            .flat_map(|entry| {
                entry
                    .get("changes")
                    .and_then(Value::as_array)
                    .unwrap_or(&empty)
                    .iter()
            })
            .flat_map(|change| {
                change
                    .pointer("/value/statuses")
                    .and_then(Value::as_array)
                    .unwrap_or(&empty)
                    .iter()
            })
            .filter_map(|status| {
                let external_id = non_empty_str(status.get("id"))?;
                let code = RawCode::from_value(status.get("status")?)?;
                let timestamp = status.get("timestamp").and_then(RawTimestamp::from_value);
                let error_message = if code.as_text() == Some("failed") {
                    Some(
                        Self::error_message(status)
                            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
                    )
                } else {
                    None
                };

                Some(RawStatus {
                    external_id,
                    code,
                    timestamp,
                    error_message,
                })
            })
            .collect()
    }

    fn map_status(&self, code: &RawCode) -> Option<DeliveryStatus> {
        match code.as_text()? {
            "delivered" => Some(DeliveryStatus::Delivered),
            "read" => Some(DeliveryStatus::Read),
            "failed" => Some(DeliveryStatus::Failed),
            _ => None,
        }
    }
}
