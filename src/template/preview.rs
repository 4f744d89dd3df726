//! Template preview against sample data.

use serde::{Deserialize, Serialize};

use super::mock::mock_payload;
use super::payload::{EventType, NotificationPayload};
use super::render::render_report;

/// Ad-hoc template text to preview
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub event_type: EventType,
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
    /// Token paths that the sample payload could not resolve
    pub unresolved: Vec<String>,
    /// Sample payload the preview was rendered against
    pub payload: NotificationPayload,
}

/// Render template text against a mock payload for its event type.
pub fn preview(request: &PreviewRequest) -> PreviewResponse {
    let payload = mock_payload(request.event_type);
    let value = payload.to_value();

    let mut unresolved = Vec::new();
    let subject = request.subject.as_deref().map(|subject| {
        let report = render_report(subject, &value);
        unresolved.extend(report.unresolved);
        report.text
    });
    let body = render_report(&request.body, &value);
    unresolved.extend(body.unresolved);

    PreviewResponse {
        subject,
        body: body.text,
        unresolved,
        payload,
    }
}
