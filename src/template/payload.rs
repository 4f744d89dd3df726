//! Event payload that notification templates are rendered against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Current payload schema version
pub const EVENT_VERSION: &str = "1.0";

/// Kinds of ticket events that produce notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "ticket.created")]
    TicketCreated,
    #[serde(rename = "ticket.updated")]
    TicketUpdated,
    #[serde(rename = "ticket.assigned")]
    TicketAssigned,
    #[serde(rename = "ticket.status_changed")]
    TicketStatusChanged,
    #[serde(rename = "ticket.commented")]
    TicketCommented,
    #[serde(rename = "ticket.approval_requested")]
    TicketApprovalRequested,
    #[serde(rename = "ticket.resolved")]
    TicketResolved,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::TicketCreated,
        EventType::TicketUpdated,
        EventType::TicketAssigned,
        EventType::TicketStatusChanged,
        EventType::TicketCommented,
        EventType::TicketApprovalRequested,
        EventType::TicketResolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TicketCreated => "ticket.created",
            EventType::TicketUpdated => "ticket.updated",
            EventType::TicketAssigned => "ticket.assigned",
            EventType::TicketStatusChanged => "ticket.status_changed",
            EventType::TicketCommented => "ticket.commented",
            EventType::TicketApprovalRequested => "ticket.approval_requested",
            EventType::TicketResolved => "ticket.resolved",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("unknown event type: {}", s))
    }
}

/// Structured description of one notification-worthy event.
///
/// Built once per event and never mutated afterwards. Templates address its
/// fields with dotted paths such as `ticket.title` or `actors.requester.name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub event_version: String,
    pub event_type: EventType,
    pub company: CompanyInfo,
    pub ticket: TicketInfo,
    pub actors: Actors,
    pub update: UpdateInfo,
    pub approval: ApprovalInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketInfo {
    pub id: String,
    /// Identifier shown to requesters (e.g. `#1042`)
    pub public_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub priority: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub portal_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actors {
    pub requester: Requester,
    /// `null` until an agent picks the ticket up
    pub assignee: Option<Agent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requester {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub kind: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalInfo {
    pub deadline_at: Option<String>,
}

impl NotificationPayload {
    /// JSON view used for token lookup.
    pub fn to_value(&self) -> serde_json::Value {
        // Plain structs with string keys always serialize
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
