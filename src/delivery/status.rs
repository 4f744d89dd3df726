//! Canonical delivery status and the transitions callbacks may apply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of one outbound message.
///
/// Callbacks only move a record forward along
/// `PENDING/PROCESSING -> SENT -> DELIVERED -> READ`; `FAILED` is reachable
/// until delivery has been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Processing,
    Sent,
    Delivered,
    Read,
    Failed,
}

const TO_DELIVERED: &[DeliveryStatus] = &[DeliveryStatus::Sent, DeliveryStatus::Processing];
const TO_READ: &[DeliveryStatus] = &[
    DeliveryStatus::Sent,
    DeliveryStatus::Delivered,
    DeliveryStatus::Processing,
];
const TO_FAILED: &[DeliveryStatus] = &[
    DeliveryStatus::Sent,
    DeliveryStatus::Processing,
    DeliveryStatus::Pending,
];

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Processing => "PROCESSING",
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Read => "READ",
            DeliveryStatus::Failed => "FAILED",
        }
    }

    /// Statuses a record must currently have for a callback to move it to `self`.
    ///
    /// Empty for statuses that callbacks never set.
    pub fn allowed_predecessors(&self) -> &'static [DeliveryStatus] {
        match self {
            DeliveryStatus::Delivered => TO_DELIVERED,
            DeliveryStatus::Read => TO_READ,
            DeliveryStatus::Failed => TO_FAILED,
            DeliveryStatus::Pending | DeliveryStatus::Processing | DeliveryStatus::Sent => &[],
        }
    }

    pub fn can_transition_to(&self, target: DeliveryStatus) -> bool {
        target.allowed_predecessors().contains(self)
    }

    /// Whether callbacks can set this status at all.
    pub fn is_callback_target(&self) -> bool {
        !self.allowed_predecessors().is_empty()
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(DeliveryStatus::Pending),
            "PROCESSING" => Ok(DeliveryStatus::Processing),
            "SENT" => Ok(DeliveryStatus::Sent),
            "DELIVERED" => Ok(DeliveryStatus::Delivered),
            "READ" => Ok(DeliveryStatus::Read),
            "FAILED" => Ok(DeliveryStatus::Failed),
            other => Err(format!("unknown delivery status: {}", other)),
        }
    }
}
