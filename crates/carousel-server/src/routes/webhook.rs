// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Inbound webhook: turns join commands from the messaging platform into
//! admissions.
//!
//! The platform POSTs every event here. Only `messages.upsert` with a text
//! matching the configured join keyword is acted on; everything else is
//! acknowledged and dropped. The route ALWAYS answers 200; a non-2xx would
//! only make the platform redeliver an event we already decided about.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use carousel_core::admission::{AdmissionOutcome, RejectReason};

use crate::state::AppState;

/// Event envelope delivered by the messaging platform.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    /// Event type, e.g. `messages.upsert`.
    pub event: String,
    /// Messaging instance the event originated from.
    pub instance: String,
    /// Event payload; shape depends on `event`.
    #[serde(default)]
    pub data: MessageData,
}

/// Payload of a `messages.upsert` event.
#[derive(Debug, Default, Deserialize)]
pub struct MessageData {
    /// Message routing key.
    #[serde(default)]
    pub key: MessageKey,
    /// Message content, absent for non-text messages.
    #[serde(default)]
    pub message: Option<MessageContent>,
}

/// Routing key of an inbound message.
#[derive(Debug, Default, Deserialize)]
pub struct MessageKey {
    /// True when the message was sent by the instance itself.
    #[serde(default, rename = "fromMe")]
    pub from_me: bool,
    /// Sender JID, e.g. `5521999999999@s.whatsapp.net`.
    #[serde(default, rename = "remoteJid")]
    pub remote_jid: String,
}

/// Text content of an inbound message, in either of the platform's shapes.
#[derive(Debug, Default, Deserialize)]
pub struct MessageContent {
    /// Plain conversation text.
    #[serde(default)]
    pub conversation: Option<String>,
    /// Extended (quoted/linked) text message.
    #[serde(default, rename = "extendedTextMessage")]
    pub extended_text_message: Option<ExtendedText>,
}

/// Extended text message body.
#[derive(Debug, Default, Deserialize)]
pub struct ExtendedText {
    /// The text itself.
    #[serde(default)]
    pub text: Option<String>,
}

/// `POST /webhook/gateway`: always answers 200.
pub async fn gateway_webhook(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "dropping unparseable webhook payload");
            return Json(json!({ "received": true, "ignored": "unparseable payload" }));
        }
    };

    if event.event != "messages.upsert" {
        return Json(json!({ "received": true, "ignored": "event type not handled" }));
    }

    if event.data.key.from_me {
        return Json(json!({ "received": true, "ignored": "fromMe" }));
    }

    let Some(text) = message_text(&event.data) else {
        return Json(json!({ "received": true, "ignored": "no text content" }));
    };

    if !is_join_command(&text, &state.join_keyword) {
        return Json(json!({ "received": true, "ignored": "not a join command" }));
    }

    let Some(phone) = phone_from_remote_jid(&event.data.key.remote_jid) else {
        warn!(remote_jid = %event.data.key.remote_jid, "join command without a sender phone");
        return Json(json!({ "received": true, "ignored": "no sender phone" }));
    };

    info!(instance = %event.instance, phone, "processing join command");

    match state.admission.admit(&event.instance, phone, None).await {
        Ok(outcome) => {
            // Acknowledgment back to the requester is best-effort; the
            // admission result stands either way.
            let ack = ack_text(&outcome);
            if let Err(err) = state
                .gateway
                .send_text_message(&event.instance, &event.data.key.remote_jid, &ack)
                .await
            {
                warn!(instance = %event.instance, error = %err, "failed to send join acknowledgment");
            }

            let reason = match &outcome {
                AdmissionOutcome::Admitted { .. } => None,
                AdmissionOutcome::Rejected(reason) => Some(reason.code()),
            };
            Json(json!({
                "received": true,
                "processed": true,
                "admitted": outcome.admitted(),
                "reason": reason,
            }))
        }
        Err(err) => {
            error!(instance = %event.instance, error = %err, "admission failed");
            Json(json!({ "received": true, "error": err.to_string() }))
        }
    }
}

/// Extract the message text from either content shape.
fn message_text(data: &MessageData) -> Option<String> {
    let message = data.message.as_ref()?;
    if let Some(text) = message.conversation.as_deref() {
        if !text.trim().is_empty() {
            return Some(text.trim().to_string());
        }
    }
    message
        .extended_text_message
        .as_ref()?
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Whether the text is the join keyword, ignoring case and surrounding
/// whitespace.
fn is_join_command(text: &str, keyword: &str) -> bool {
    text.trim().to_uppercase() == keyword.trim().to_uppercase()
}

/// The sender phone is the JID prefix before `@`
/// (`5521999999999@s.whatsapp.net` or `5521999999999@c.us`).
fn phone_from_remote_jid(remote_jid: &str) -> Option<&str> {
    let phone = remote_jid.split('@').next().unwrap_or_default();
    if phone.is_empty() { None } else { Some(phone) }
}

/// User-facing acknowledgment for an admission outcome.
fn ack_text(outcome: &AdmissionOutcome) -> String {
    match outcome {
        AdmissionOutcome::Admitted { pool_title, .. } => {
            format!("✅ Você foi adicionado ao grupo {pool_title}!")
        }
        AdmissionOutcome::Rejected(reason) => format!("❌ {}", reject_message(*reason)),
    }
}

fn reject_message(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::CampaignNotFound => "Campanha não encontrada ou instância não configurada.",
        RejectReason::NoActiveGroup => {
            "Nenhum grupo ativo disponível no momento. Tente novamente em instantes."
        }
        RejectReason::ActiveGroupMissing => {
            "Grupo ativo não encontrado. Tente novamente em instantes."
        }
        RejectReason::GroupFull => "Grupo está cheio. Uma nova rotação será feita em breve.",
        RejectReason::GatewayAddFailed => "Erro ao adicionar ao grupo. Tente novamente.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_command_matching_ignores_case_and_whitespace() {
        assert!(is_join_command("ENTRAR", "ENTRAR"));
        assert!(is_join_command("  entrar  ", "ENTRAR"));
        assert!(is_join_command("Entrar", "ENTRAR"));
        assert!(!is_join_command("ENTRAR AGORA", "ENTRAR"));
        assert!(!is_join_command("sair", "ENTRAR"));
    }

    #[test]
    fn phone_extraction_from_jid() {
        assert_eq!(
            phone_from_remote_jid("5521999999999@s.whatsapp.net"),
            Some("5521999999999")
        );
        assert_eq!(
            phone_from_remote_jid("5521999999999@c.us"),
            Some("5521999999999")
        );
        assert_eq!(phone_from_remote_jid("@s.whatsapp.net"), None);
        assert_eq!(phone_from_remote_jid(""), None);
    }

    #[test]
    fn text_extraction_prefers_conversation() {
        let data = MessageData {
            key: MessageKey::default(),
            message: Some(MessageContent {
                conversation: Some(" ENTRAR ".to_string()),
                extended_text_message: Some(ExtendedText {
                    text: Some("other".to_string()),
                }),
            }),
        };
        assert_eq!(message_text(&data).as_deref(), Some("ENTRAR"));
    }

    #[test]
    fn text_extraction_falls_back_to_extended_text() {
        let data = MessageData {
            key: MessageKey::default(),
            message: Some(MessageContent {
                conversation: None,
                extended_text_message: Some(ExtendedText {
                    text: Some("entrar".to_string()),
                }),
            }),
        };
        assert_eq!(message_text(&data).as_deref(), Some("entrar"));

        let empty = MessageData::default();
        assert_eq!(message_text(&empty), None);
    }

    #[test]
    fn webhook_envelope_deserializes_platform_payload() {
        let payload = serde_json::json!({
            "event": "messages.upsert",
            "instance": "inst-a",
            "data": {
                "key": {
                    "remoteJid": "5521999999999@s.whatsapp.net",
                    "fromMe": false,
                    "id": "ABCDEF"
                },
                "message": {
                    "conversation": "ENTRAR"
                },
                "messageTimestamp": 1735689600
            }
        });

        let event: WebhookEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(event.event, "messages.upsert");
        assert_eq!(event.instance, "inst-a");
        assert!(!event.data.key.from_me);
        assert_eq!(message_text(&event.data).as_deref(), Some("ENTRAR"));
    }

    #[test]
    fn ack_texts_cover_every_outcome() {
        let admitted = AdmissionOutcome::Admitted {
            external_group_id: "123@g.us".to_string(),
            pool_title: "Promo VIP".to_string(),
        };
        assert_eq!(ack_text(&admitted), "✅ Você foi adicionado ao grupo Promo VIP!");

        let full = AdmissionOutcome::Rejected(RejectReason::GroupFull);
        assert!(ack_text(&full).starts_with("❌ "));
    }
}
