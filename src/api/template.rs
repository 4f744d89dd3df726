//! Template CRUD, preview and render endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::server::AppState;
use crate::template::{
    preview, CreateTemplateRequest, NotificationPayload, PreviewRequest, PreviewResponse,
    RenderedMessage, Template, TemplateChannel, TemplateListResponse, UpdateTemplateRequest,
};

/// Body of `POST /api/v1/render`
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub channel: TemplateChannel,
    pub payload: NotificationPayload,
}

/// POST /api/v1/templates - Create a new template
#[tracing::instrument(
    name = "http.create_template",
    skip(state, request),
    fields(template_id = %request.id)
)]
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Template>)> {
    let template: Template = request.into();
    let created = state.template_store.create(template)?;

    tracing::info!(
        event_type = %created.event_type,
        channel = %created.channel,
        "Template created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/templates - List all templates
#[tracing::instrument(name = "http.list_templates", skip(state))]
pub async fn list_templates(State(state): State<AppState>) -> Json<TemplateListResponse> {
    let templates = state.template_store.list();
    let total = templates.len();

    Json(TemplateListResponse { templates, total })
}

/// GET /api/v1/templates/{id} - Get a specific template
#[tracing::instrument(name = "http.get_template", skip(state))]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Template>> {
    Ok(Json(state.template_store.get(&id)?))
}

/// PUT /api/v1/templates/{id} - Update an existing template
#[tracing::instrument(name = "http.update_template", skip(state, request))]
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<Json<Template>> {
    Ok(Json(state.template_store.update(&id, request)?))
}

/// DELETE /api/v1/templates/{id} - Delete a template
#[tracing::instrument(name = "http.delete_template", skip(state))]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.template_store.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/templates/preview - Render ad-hoc text against sample data
#[tracing::instrument(
    name = "http.preview_template",
    skip(request),
    fields(event_type = %request.event_type)
)]
pub async fn preview_template(Json(request): Json<PreviewRequest>) -> Json<PreviewResponse> {
    Json(preview(&request))
}

/// POST /api/v1/render - Render the stored template for an event
#[tracing::instrument(
    name = "http.render_template",
    skip(state, request),
    fields(event_type = %request.payload.event_type, channel = %request.channel)
)]
pub async fn render_template(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderedMessage>> {
    let rendered = state
        .template_store
        .render_for(request.channel, &request.payload)?;
    Ok(Json(rendered))
}
