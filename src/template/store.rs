//! In-memory template storage

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use crate::metrics::TemplateMetrics;

use super::payload::{EventType, NotificationPayload};
use super::render::render_report;
use super::types::{
    RenderedMessage, Template, TemplateChannel, TemplateError, TemplateResult,
    UpdateTemplateRequest,
};

/// In-memory template storage
pub struct TemplateStore {
    templates: DashMap<String, Template>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateStore {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    pub fn create(&self, template: Template) -> TemplateResult<Template> {
        template.validate()?;

        match self.templates.entry(template.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(TemplateError::AlreadyExists(template.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(template.clone());
                Ok(template)
            }
        }
    }

    pub fn get(&self, id: &str) -> TemplateResult<Template> {
        self.templates
            .get(id)
            .map(|t| t.clone())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    /// List all templates, ordered by ID
    pub fn list(&self) -> Vec<Template> {
        let mut templates: Vec<Template> = self
            .templates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    pub fn update(&self, id: &str, updates: UpdateTemplateRequest) -> TemplateResult<Template> {
        let mut template = self.get(id)?;

        if let Some(name) = updates.name {
            template.name = name;
        }

        if let Some(event_type) = updates.event_type {
            template.event_type = event_type;
        }

        if let Some(channel) = updates.channel {
            template.channel = channel;
        }

        if let Some(subject) = updates.subject {
            template.subject = subject;
        }

        if let Some(body) = updates.body {
            template.body = body;
        }

        template.updated_at = Utc::now();
        template.validate()?;

        self.templates.insert(id.to_string(), template.clone());

        Ok(template)
    }

    pub fn delete(&self, id: &str) -> TemplateResult<()> {
        self.templates
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.templates.len()
    }

    /// Find the template for an event on a channel.
    ///
    /// A channel-specific template wins over the `default` one. Ties are broken
    /// by the lowest template ID so resolution is stable.
    pub fn resolve(
        &self,
        event_type: EventType,
        channel: TemplateChannel,
    ) -> TemplateResult<Template> {
        let pick = |wanted: TemplateChannel| {
            self.templates
                .iter()
                .filter(|entry| entry.event_type == event_type && entry.channel == wanted)
                .map(|entry| entry.value().clone())
                .min_by(|a, b| a.id.cmp(&b.id))
        };

        pick(channel)
            .or_else(|| pick(TemplateChannel::Default))
            .ok_or(TemplateError::NoTemplateFor {
                event_type,
                channel,
            })
    }

    /// Render the template resolved for the payload's event on `channel`.
    pub fn render_for(
        &self,
        channel: TemplateChannel,
        payload: &NotificationPayload,
    ) -> TemplateResult<RenderedMessage> {
        let template = self.resolve(payload.event_type, channel)?;
        let value = payload.to_value();

        let subject = template
            .subject
            .as_deref()
            .map(|subject| render_report(subject, &value));
        let body = render_report(&template.body, &value);

        let unresolved = body.unresolved.len()
            + subject.as_ref().map_or(0, |s| s.unresolved.len());
        TemplateMetrics::record_render(unresolved);

        if unresolved > 0 {
            tracing::warn!(
                template_id = %template.id,
                event_type = %payload.event_type,
                unresolved = unresolved,
                "Template rendered with unresolved tokens"
            );
        }

        Ok(RenderedMessage {
            template_id: template.id,
            subject: subject.map(|s| s.text),
            body: body.text,
        })
    }
}

/// Create an Arc-wrapped template store
pub fn create_template_store() -> Arc<TemplateStore> {
    Arc::new(TemplateStore::new())
}
