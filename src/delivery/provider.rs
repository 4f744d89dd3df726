//! Provider adapter seam.
//!
//! Each messaging provider reports delivery progress in its own payload shape
//! and vocabulary. An adapter pulls `(external_id, code, timestamp)` triples out
//! of a callback body and maps codes onto [`DeliveryStatus`]; everything after
//! that is shared by the [`Reconciler`](super::Reconciler).

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::status::DeliveryStatus;

/// Status code as the provider sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCode {
    Text(String),
    Number(i64),
}

impl RawCode {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RawCode::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(RawCode::Number),
            _ => None,
        }
    }

    /// Numeric value, accepting numeric strings such as `"3"`.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            RawCode::Number(n) => Some(*n),
            RawCode::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawCode::Text(s) => Some(s.as_str()),
            RawCode::Number(_) => None,
        }
    }
}

/// Event time as the provider sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTimestamp {
    EpochSeconds(i64),
    Iso(String),
}

impl RawTimestamp {
    /// Accepts epoch seconds as a JSON number or a digit string, or an RFC 3339 string.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RawTimestamp::EpochSeconds),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else if s.bytes().all(|b| b.is_ascii_digit()) {
                    s.parse().ok().map(RawTimestamp::EpochSeconds)
                } else {
                    Some(RawTimestamp::Iso(s.to_string()))
                }
            }
            _ => None,
        }
    }

    /// Absolute time, if the value is well-formed.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::EpochSeconds(secs) => Utc.timestamp_opt(*secs, 0).single(),
            RawTimestamp::Iso(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// One status report extracted from a callback body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatus {
    pub external_id: String,
    pub code: RawCode,
    pub timestamp: Option<RawTimestamp>,
    /// Provider-supplied failure description, if any
    pub error_message: Option<String>,
}

impl RawStatus {
    /// Event time, or `received_at` when missing or unparseable.
    pub fn occurred_at(&self, received_at: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp
            .as_ref()
            .and_then(RawTimestamp::to_datetime)
            .unwrap_or(received_at)
    }
}

/// Strategy describing one provider's callback format.
pub trait ProviderAdapter: Send + Sync {
    /// Provider name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Every status report in `body`, in payload order. Malformed entries are skipped.
    fn extract(&self, body: &Value) -> Vec<RawStatus>;

    /// Canonical status for a provider code; `None` means "ignore".
    fn map_status(&self, code: &RawCode) -> Option<DeliveryStatus>;
}

/// Non-empty string at `value`, or `None`.
pub(crate) fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_code_numeric_string() {
        assert_eq!(RawCode::Text("3".to_string()).as_number(), Some(3));
        assert_eq!(RawCode::Number(4).as_number(), Some(4));
        assert_eq!(RawCode::Text("READ".to_string()).as_number(), None);
        assert_eq!(RawCode::from_value(&json!(null)), None);
    }

    #[test]
    fn test_timestamp_epoch_seconds() {
        let ts = RawTimestamp::from_value(&json!("1700000000")).unwrap();
        assert_eq!(ts, RawTimestamp::EpochSeconds(1_700_000_000));
        assert_eq!(ts.to_datetime().unwrap().timestamp(), 1_700_000_000);

        let ts = RawTimestamp::from_value(&json!(1_700_000_000)).unwrap();
        assert_eq!(ts.to_datetime().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_timestamp_iso() {
        let ts = RawTimestamp::from_value(&json!("2026-03-09T14:05:00-03:00")).unwrap();
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-09T17:05:00+00:00");
    }

    #[test]
    fn test_occurred_at_falls_back_to_received() {
        let received = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let raw = RawStatus {
            external_id: "x".to_string(),
            code: RawCode::Text("read".to_string()),
            timestamp: Some(RawTimestamp::Iso("yesterday".to_string())),
            error_message: None,
        };
        assert_eq!(raw.occurred_at(received), received);

        let raw = RawStatus {
            timestamp: None,
            ..raw
        };
        assert_eq!(raw.occurred_at(received), received);
    }
}
