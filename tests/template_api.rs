//! Template administration API integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use desk_notification_service::config::Settings;
use desk_notification_service::delivery::MemoryRecordStore;
use desk_notification_service::server::{create_app, AppState};
use desk_notification_service::template::{mock_payload, EventType};

fn app_with(settings: Settings) -> Router {
    let state = AppState::new(settings, Arc::new(MemoryRecordStore::new()), None);
    create_app(state)
}

fn app() -> Router {
    app_with(Settings::with_secrets("verify", "evo"))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn created_template() -> Value {
    json!({
        "id": "ticket-created-email",
        "name": "Ticket created (email)",
        "event_type": "ticket.created",
        "channel": "email",
        "subject": "[{{company.name}}] {{ticket.public_id}}",
        "body": "Olá {{actors.requester.name}}, recebemos {{ticket.title}}."
    })
}

#[tokio::test]
async fn test_template_crud_lifecycle() {
    let app = app();

    let (status, body) = call(&app, Method::POST, "/api/v1/templates", Some(created_template())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], json!("ticket-created-email"));

    let (status, body) = call(&app, Method::POST, "/api/v1/templates", Some(created_template())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("CONFLICT"));

    let (status, body) = call(&app, Method::GET, "/api/v1/templates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(1));

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/v1/templates/ticket-created-email",
        Some(json!({"subject": null, "body": "Novo chamado {{ticket.public_id}}"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], Value::Null);
    assert_eq!(body["body"], json!("Novo chamado {{ticket.public_id}}"));

    let (status, _) = call(&app, Method::DELETE, "/api/v1/templates/ticket-created-email", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(&app, Method::GET, "/api/v1/templates/ticket-created-email", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_create_rejects_invalid_id() {
    let app = app();
    let mut template = created_template();
    template["id"] = json!("bad id!");

    let (status, body) = call(&app, Method::POST, "/api/v1/templates", Some(template)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_preview_uses_mock_payload() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/templates/preview",
        Some(json!({
            "event_type": "ticket.approval_requested",
            "subject": "Aprovação pendente: {{ticket.public_id}}",
            "body": "Prazo {{approval.deadline_at}} {{ticket.nope}}"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let public_id = body["payload"]["ticket"]["public_id"].as_str().unwrap();
    assert_eq!(
        body["subject"],
        json!(format!("Aprovação pendente: {}", public_id))
    );
    assert!(body["body"].as_str().unwrap().ends_with("{{ticket.nope}}"));
    assert!(!body["body"].as_str().unwrap().contains("{{approval.deadline_at}}"));
    assert_eq!(body["unresolved"], json!(["ticket.nope"]));
}

#[tokio::test]
async fn test_render_falls_back_to_default_channel() {
    let app = app();
    let mut template = created_template();
    template["id"] = json!("ticket-created-default");
    template["channel"] = json!("default");
    call(&app, Method::POST, "/api/v1/templates", Some(template)).await;

    let payload = mock_payload(EventType::TicketCreated);
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/render",
        Some(json!({"channel": "whatsapp", "payload": payload})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template_id"], json!("ticket-created-default"));
    assert_eq!(
        body["body"],
        json!(format!(
            "Olá {}, recebemos {}.",
            payload.actors.requester.name, payload.ticket.title
        ))
    );
}

#[tokio::test]
async fn test_render_without_template_is_not_found() {
    let app = app();
    let payload = mock_payload(EventType::TicketResolved);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/render",
        Some(json!({"channel": "email", "payload": payload})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_api_requires_key_when_configured() {
    let mut settings = Settings::with_secrets("verify", "evo");
    settings.api.key = Some("admin-key".to_string());
    let app = app_with(settings);

    let (status, _) = call(&app, Method::GET, "/api/v1/templates", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/v1/templates")
        .header("X-API-Key", "admin-key")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Health stays public
    let (status, _) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
