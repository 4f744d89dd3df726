//! Sample payloads for previewing templates before a real event exists.

use chrono::{DateTime, Duration, Utc};

use super::payload::{
    Actors, Agent, ApprovalInfo, CompanyInfo, EventType, NotificationPayload, Requester,
    TicketInfo, UpdateInfo, EVENT_VERSION,
};

/// Display format for dates inside payloads (`dd/MM/yyyy HH:mm`)
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Build a representative payload for `event_type` using the current time.
pub fn mock_payload(event_type: EventType) -> NotificationPayload {
    mock_payload_at(event_type, Utc::now())
}

/// Build a representative payload for `event_type` relative to `now`.
///
/// Every field a template can reference is populated, so previews exercise
/// the same token paths as production payloads.
pub fn mock_payload_at(event_type: EventType, now: DateTime<Utc>) -> NotificationPayload {
    let created_at = (now - Duration::hours(2)).format(DISPLAY_DATE_FORMAT).to_string();
    let updated_at = now.format(DISPLAY_DATE_FORMAT).to_string();
    let deadline_at = (now + Duration::hours(24))
        .format(DISPLAY_DATE_FORMAT)
        .to_string();

    let (kind, summary, status) = match event_type {
        EventType::TicketCreated => ("created", "Novo chamado aberto pelo solicitante", "open"),
        EventType::TicketUpdated => ("updated", "Descrição do chamado atualizada", "open"),
        EventType::TicketAssigned => ("assigned", "Chamado atribuído a Carlos Mendes", "in_progress"),
        EventType::TicketStatusChanged => {
            ("status_changed", "Status alterado de Aberto para Em andamento", "in_progress")
        }
        EventType::TicketCommented => ("commented", "Novo comentário adicionado ao chamado", "in_progress"),
        EventType::TicketApprovalRequested => {
            ("approval_requested", "Aprovação necessária para prosseguir", "waiting_approval")
        }
        EventType::TicketResolved => ("resolved", "Chamado marcado como resolvido", "resolved"),
    };

    NotificationPayload {
        event_version: EVENT_VERSION.to_string(),
        event_type,
        company: CompanyInfo {
            id: "00000000-0000-4000-8000-000000000001".to_string(),
            name: "Empresa Exemplo Ltda".to_string(),
        },
        ticket: TicketInfo {
            id: "00000000-0000-4000-8000-000000001042".to_string(),
            public_id: "#1042".to_string(),
            title: "Impressora do financeiro não imprime".to_string(),
            ticket_type: "incident".to_string(),
            priority: "high".to_string(),
            status: status.to_string(),
            created_at,
            updated_at,
            portal_url: "https://desk.antropia.example/portal/tickets/1042".to_string(),
        },
        actors: Actors {
            requester: Requester {
                name: "Ana Souza".to_string(),
                email: "ana.souza@example.com".to_string(),
                phone: Some("+5511999990000".to_string()),
            },
            assignee: Some(Agent {
                name: "Carlos Mendes".to_string(),
                email: "carlos.mendes@example.com".to_string(),
            }),
        },
        update: UpdateInfo {
            kind: kind.to_string(),
            summary: summary.to_string(),
        },
        approval: ApprovalInfo {
            deadline_at: Some(deadline_at),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::render;
    use chrono::TimeZone;

    const DOCUMENTED_TOKENS: [&str; 20] = [
        "event_version",
        "event_type",
        "company.id",
        "company.name",
        "ticket.id",
        "ticket.public_id",
        "ticket.title",
        "ticket.type",
        "ticket.priority",
        "ticket.status",
        "ticket.created_at",
        "ticket.updated_at",
        "ticket.portal_url",
        "actors.requester.name",
        "actors.requester.email",
        "actors.requester.phone",
        "actors.assignee.name",
        "actors.assignee.email",
        "update.kind",
        "approval.deadline_at",
    ];

    #[test]
    fn test_deadline_is_now_plus_24h() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 0).unwrap();
        let payload = mock_payload_at(EventType::TicketApprovalRequested, now);
        assert_eq!(payload.approval.deadline_at.as_deref(), Some("10/03/2026 14:05"));
        assert_eq!(payload.ticket.updated_at, "09/03/2026 14:05");
        assert_eq!(payload.ticket.created_at, "09/03/2026 12:05");
    }

    #[test]
    fn test_every_documented_token_resolves() {
        for event in EventType::ALL {
            let value = mock_payload(event).to_value();
            for path in DOCUMENTED_TOKENS {
                let token = format!("{{{{{}}}}}", path);
                let rendered = render(&token, &value);
                assert_ne!(rendered, token, "{} unresolved for {}", path, event);
            }
            assert_ne!(render("{{update.summary}}", &value), "{{update.summary}}");
        }
    }

    #[test]
    fn test_event_type_carried_into_payload() {
        let payload = mock_payload(EventType::TicketResolved);
        assert_eq!(payload.event_type, EventType::TicketResolved);
        assert_eq!(payload.update.kind, "resolved");
        assert_eq!(payload.to_value()["event_type"], "ticket.resolved");
    }

    #[test]
    fn test_same_keys_for_all_event_types() {
        let keys = |event| {
            let value = mock_payload(event).to_value();
            value
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect::<Vec<_>>()
        };
        let reference = keys(EventType::TicketCreated);
        for event in EventType::ALL {
            assert_eq!(keys(event), reference);
        }
    }
}
