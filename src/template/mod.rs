//! Notification template system.
//!
//! This module provides:
//! - A `{{dotted.path}}` renderer over nested JSON payloads
//! - The typed `NotificationPayload` templates are rendered against
//! - A mock payload generator for previews
//! - In-memory template storage keyed by event type and channel
//!
//! # Example
//!
//! ```ignore
//! let store = TemplateStore::new();
//!
//! store.create(Template {
//!     id: "ticket-created-email".to_string(),
//!     name: "Ticket created".to_string(),
//!     event_type: EventType::TicketCreated,
//!     channel: TemplateChannel::Email,
//!     subject: Some("[{{company.name}}] {{ticket.title}}".to_string()),
//!     body: "Hi {{actors.requester.name}}, we received {{ticket.public_id}}".to_string(),
//!     created_at: Utc::now(),
//!     updated_at: Utc::now(),
//! })?;
//!
//! let rendered = store.render_for(TemplateChannel::Email, &payload)?;
//! ```
//!
//! Tokens that cannot be resolved are left in the output unchanged.

mod mock;
mod payload;
mod preview;
mod render;
mod store;
mod types;

pub use mock::{mock_payload, mock_payload_at, DISPLAY_DATE_FORMAT};
pub use payload::{
    Actors, Agent, ApprovalInfo, CompanyInfo, EventType, NotificationPayload, Requester,
    TicketInfo, UpdateInfo, EVENT_VERSION,
};
pub use preview::{preview, PreviewRequest, PreviewResponse};
pub use render::{render, render_report, resolve_path, RenderReport};
pub use store::{create_template_store, TemplateStore};
pub use types::{
    CreateTemplateRequest, RenderedMessage, Template, TemplateChannel, TemplateError,
    TemplateListResponse, TemplateResult, UpdateTemplateRequest,
};
