// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Evolution-compatible HTTP implementation of the group gateway contract.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Url;
use serde_json::json;
use tracing::{debug, warn};

use carousel_core::gateway::{
    CreatedGroup, GatewayError, GroupGateway, GroupMode, InviteInfo, Result, RetryPolicy,
};

use crate::config::GatewayConfig;

/// Longest upstream error body kept in error messages and logs.
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for an Evolution-compatible group-provisioning API.
pub struct HttpGroupGateway {
    http: reqwest::Client,
    base_url: Url,
    timeout_ms: u64,
}

impl HttpGroupGateway {
    /// Build a client from configuration.
    ///
    /// The API key becomes a default header; the timeout applies to every
    /// request the client makes.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        // Url::join treats a base without a trailing slash as a file and
        // would drop its last path segment.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| GatewayError::InvalidConfig(format!("base URL '{base}': {err}")))?;

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| GatewayError::InvalidConfig("API key is not a valid header".into()))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| GatewayError::InvalidConfig(err.to_string()))?;

        Ok(Self {
            http,
            base_url,
            timeout_ms: config.timeout.as_millis() as u64,
        })
    }

    fn endpoint(&self, path: &str, instance: &str) -> Result<Url> {
        self.base_url
            .join(&format!("{path}/{instance}"))
            .map_err(|err| GatewayError::InvalidConfig(format!("endpoint '{path}': {err}")))
    }

    fn map_transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout_ms)
        } else {
            GatewayError::Transport(err.to_string())
        }
    }

    /// Send a request and fail on non-success statuses, keeping a bounded
    /// slice of the upstream body for diagnostics.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        Ok(response)
    }

    async fn fetch_invite(&self, instance: &str, group_id: &str) -> Result<InviteInfo> {
        let url = self.endpoint("group/inviteCode", instance)?;
        let response = self
            .execute(self.http.get(url).query(&[("groupJid", group_id)]))
            .await?;
        response
            .json::<InviteInfo>()
            .await
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[async_trait]
impl GroupGateway for HttpGroupGateway {
    async fn create_group(
        &self,
        instance: &str,
        subject: &str,
        participants: &[String],
    ) -> Result<CreatedGroup> {
        // Group creation is not idempotent upstream: one attempt only.
        let url = self.endpoint("group/create", instance)?;
        debug!(instance, subject, "creating group upstream");
        let response = self
            .execute(self.http.post(url).json(&json!({
                "subject": subject,
                "participants": participants,
            })))
            .await?;
        response
            .json::<CreatedGroup>()
            .await
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))
    }

    async fn set_group_photo(&self, instance: &str, group_id: &str, photo_url: &str) -> Result<()> {
        let url = self.endpoint("group/updateGroupPicture", instance)?;
        self.execute(
            self.http
                .post(url)
                .query(&[("groupJid", group_id)])
                .json(&json!({ "image": photo_url })),
        )
        .await?;
        Ok(())
    }

    async fn set_group_description(
        &self,
        instance: &str,
        group_id: &str,
        description: &str,
    ) -> Result<()> {
        let url = self.endpoint("group/updateGroupDescription", instance)?;
        self.execute(
            self.http
                .post(url)
                .query(&[("groupJid", group_id)])
                .json(&json!({ "description": description })),
        )
        .await?;
        Ok(())
    }

    async fn set_group_mode(&self, instance: &str, group_id: &str, mode: GroupMode) -> Result<()> {
        let url = self.endpoint("group/updateSetting", instance)?;
        self.execute(
            self.http
                .post(url)
                .query(&[("groupJid", group_id)])
                .json(&json!({ "action": mode.as_str() })),
        )
        .await?;
        Ok(())
    }

    async fn create_invite(&self, instance: &str, group_id: &str) -> Result<InviteInfo> {
        // The invite lookup is a GET upstream: safe for bounded retry.
        let policy = RetryPolicy::IdempotentRead;
        let mut attempt = 1u32;
        loop {
            match self.fetch_invite(instance, group_id).await {
                Ok(invite) => return Ok(invite),
                Err(err) if attempt < policy.max_attempts() => {
                    warn!(
                        instance,
                        group = group_id,
                        attempt,
                        error = %err,
                        "invite lookup failed, retrying"
                    );
                    tokio::time::sleep(policy.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn add_participant(&self, instance: &str, group_id: &str, phone: &str) -> Result<()> {
        let url = self.endpoint("group/updateParticipant", instance)?;
        debug!(instance, group = group_id, "adding participant upstream");
        // Some upstream versions answer 200 with a per-participant status
        // list instead of failing the request; the body is ignored either way.
        self.execute(
            self.http
                .post(url)
                .query(&[("groupJid", group_id)])
                .json(&json!({
                    "action": "add",
                    "participants": [phone],
                })),
        )
        .await?;
        Ok(())
    }

    async fn send_text_message(&self, instance: &str, to: &str, text: &str) -> Result<()> {
        let url = self.endpoint("message/sendText", instance)?;
        self.execute(self.http.post(url).json(&json!({
            "number": to,
            "text": text,
        })))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_error_bodies() {
        let body = "x".repeat(2 * MAX_ERROR_BODY);
        assert_eq!(truncate_body(body).len(), MAX_ERROR_BODY);

        let short = "short".to_string();
        assert_eq!(truncate_body(short), "short");
    }

    #[test]
    fn base_url_gets_a_trailing_slash() {
        let gateway =
            HttpGroupGateway::new(GatewayConfig::new("https://api.example.com/v2", "key"))
                .expect("client should build");
        let url = gateway
            .endpoint("group/create", "inst-a")
            .expect("endpoint should join");
        assert_eq!(url.as_str(), "https://api.example.com/v2/group/create/inst-a");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = HttpGroupGateway::new(GatewayConfig::new("not a url", "key"));
        assert!(matches!(result, Err(GatewayError::InvalidConfig(_))));
    }
}
