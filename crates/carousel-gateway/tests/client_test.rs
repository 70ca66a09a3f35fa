// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP gateway client tests against a mocked upstream.
//!
//! Verifies the wire shapes the Evolution-compatible API expects, the
//! per-operation retry policy, and error mapping.

use std::time::Duration;

use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use carousel_core::gateway::{GatewayError, GroupGateway, GroupMode};
use carousel_gateway::{GatewayConfig, HttpGroupGateway};

async fn gateway_for(server: &MockServer) -> HttpGroupGateway {
    HttpGroupGateway::new(GatewayConfig::new(server.uri(), "test-key"))
        .expect("client should build")
}

#[tokio::test]
async fn create_group_posts_subject_participants_and_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/group/create/inst-a"))
        .and(header("apikey", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "subject": "Promo VIP #01",
            "participants": ["5521900000001", "5521900000002"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "120363000000000001@g.us",
            "subject": "Promo VIP #01",
            "size": 2,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    let created = gateway
        .create_group(
            "inst-a",
            "Promo VIP #01",
            &["5521900000001".to_string(), "5521900000002".to_string()],
        )
        .await
        .expect("create_group should succeed");

    assert_eq!(created.external_id(), Some("120363000000000001@g.us"));
    assert_eq!(created.initial_size(), 2);
}

#[tokio::test]
async fn create_group_is_never_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/group/create/inst-a"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1) // exactly one attempt, no blind retry
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    let err = gateway
        .create_group("inst-a", "Promo #01", &["a".to_string(), "b".to_string()])
        .await
        .expect_err("create_group should fail");

    match err {
        GatewayError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_invite_retries_transient_failures() {
    let server = MockServer::start().await;

    // First two attempts fail, the third answers with a bare short code.
    Mock::given(method("GET"))
        .and(path("/group/inviteCode/inst-a"))
        .and(query_param("groupJid", "123@g.us"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/inviteCode/inst-a"))
        .and(query_param("groupJid", "123@g.us"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "code": "AbCdEf123" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    let invite = gateway
        .create_invite("inst-a", "123@g.us")
        .await
        .expect("create_invite should succeed after retries");

    assert_eq!(
        invite.canonical_url().as_deref(),
        Some("https://chat.whatsapp.com/AbCdEf123")
    );
}

#[tokio::test]
async fn create_invite_gives_up_after_bounded_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/group/inviteCode/inst-a"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3) // RetryPolicy::IdempotentRead allows three attempts
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    let err = gateway
        .create_invite("inst-a", "123@g.us")
        .await
        .expect_err("create_invite should give up");
    assert!(matches!(err, GatewayError::Http { status: 502, .. }));
}

#[tokio::test]
async fn add_participant_posts_add_action() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/group/updateParticipant/inst-a"))
        .and(query_param("groupJid", "123@g.us"))
        .and(body_partial_json(serde_json::json!({
            "action": "add",
            "participants": ["5521999999999"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    gateway
        .add_participant("inst-a", "123@g.us", "5521999999999")
        .await
        .expect("add_participant should succeed");
}

#[tokio::test]
async fn add_participant_failure_is_surfaced_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/group/updateParticipant/inst-a"))
        .respond_with(ResponseTemplate::new(403).set_body_string("not an admin"))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    let err = gateway
        .add_participant("inst-a", "123@g.us", "5521999999999")
        .await
        .expect_err("add_participant should fail");
    assert!(matches!(err, GatewayError::Http { status: 403, .. }));
}

#[tokio::test]
async fn group_mode_uses_settings_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/group/updateSetting/inst-a"))
        .and(query_param("groupJid", "123@g.us"))
        .and(body_partial_json(
            serde_json::json!({ "action": "announcement" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    gateway
        .set_group_mode("inst-a", "123@g.us", GroupMode::Announcement)
        .await
        .expect("set_group_mode should succeed");
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/group/inviteCode/inst-a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "code": "late" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config =
        GatewayConfig::new(server.uri(), "test-key").with_timeout(Duration::from_millis(50));
    let gateway = HttpGroupGateway::new(config).expect("client should build");

    let err = gateway
        .create_invite("inst-a", "123@g.us")
        .await
        .expect_err("request should time out");
    assert!(matches!(err, GatewayError::Timeout(50)));
}
