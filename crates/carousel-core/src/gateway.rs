// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! External group-provisioning gateway contract.
//!
//! The gateway is the upstream messaging platform's group API: create a
//! group, dress it up (photo, description, posting mode), mint an invite
//! link, add a participant. The engines depend only on this trait; the HTTP
//! implementation lives in `carousel-gateway`.
//!
//! The upstream API is treated as untrusted and only partially idempotent.
//! Which calls may be retried automatically is an explicit per-operation
//! policy ([`RetryPolicy`]), not a blanket wrapper: group creation and
//! participant mutation are never retried blindly, invite lookup is a
//! bounded retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from gateway operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Upstream answered with a non-success status.
    #[error("upstream returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated by the client.
        body: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("gateway request timed out after {0}ms")]
    Timeout(u64),

    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("gateway transport error: {0}")]
    Transport(String),

    /// Upstream answered 2xx but the body was not what the contract promises.
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),

    /// The client configuration is unusable (bad base URL, bad API key).
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Automatic retry policy for a gateway operation.
///
/// Replaces the blanket retry-on-error wrapper the upstream client used to
/// have: each operation declares whether the upstream endpoint is safe to
/// call again after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Creation/mutation calls. Never retried automatically; the failure is
    /// surfaced to the caller, which may retry the whole enclosing
    /// operation.
    None,
    /// Idempotent reads. Bounded retry with linear backoff.
    IdempotentRead,
}

impl RetryPolicy {
    /// Total attempts allowed, including the first.
    pub fn max_attempts(self) -> u32 {
        match self {
            Self::None => 1,
            Self::IdempotentRead => 3,
        }
    }

    /// Delay before the given retry (1-indexed: the delay after attempt N).
    pub fn backoff(self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::IdempotentRead => Duration::from_millis(200 * u64::from(attempt)),
        }
    }
}

/// Response from group creation.
///
/// The upstream API has shipped both `id` and `gid` for the group JID across
/// versions; accept either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatedGroup {
    /// External group identifier (e.g. `120363423328612694@g.us`).
    #[serde(default)]
    pub id: Option<String>,
    /// Legacy alias for [`CreatedGroup::id`].
    #[serde(default)]
    pub gid: Option<String>,
    /// Member count at creation time (includes bootstrap members).
    #[serde(default)]
    pub size: Option<i32>,
}

impl CreatedGroup {
    /// The external group identifier, whichever field carried it.
    pub fn external_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.gid.as_deref().filter(|id| !id.is_empty()))
    }

    /// Initial member count, defaulting to 0 when upstream omits it.
    pub fn initial_size(&self) -> i32 {
        self.size.unwrap_or(0)
    }
}

/// Canonical prefix for invite links built from a bare short code.
pub const INVITE_URL_PREFIX: &str = "https://chat.whatsapp.com/";

/// Response from invite creation.
///
/// Upstream may answer with a full URL (`inviteUrl` or `url`) or only a
/// short `code`; [`InviteInfo::canonical_url`] normalizes all three shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InviteInfo {
    /// Direct invite URL.
    #[serde(default, rename = "inviteUrl")]
    pub invite_url: Option<String>,
    /// Alternate field some upstream versions use for the invite URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Bare invite short code.
    #[serde(default)]
    pub code: Option<String>,
}

impl InviteInfo {
    /// Derive the canonical invite URL, or `None` if the response carried
    /// no usable link in any of its shapes.
    pub fn canonical_url(&self) -> Option<String> {
        if let Some(url) = self.invite_url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        self.code
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|code| format!("{INVITE_URL_PREFIX}{code}"))
    }
}

/// Posting mode applied to a freshly created group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// Only admins may post (broadcast-style campaign group).
    Announcement,
    /// Every member may post.
    Open,
}

impl GroupMode {
    /// Wire value for the upstream settings endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::Open => "not_announcement",
        }
    }
}

/// Contract to the external group-provisioning API.
///
/// Injected into the engines as `Arc<dyn GroupGateway>`; never a
/// process-wide singleton. Implementations must bound every call with an
/// explicit timeout: calls run inside open database transactions and hold
/// row locks for their duration.
#[async_trait]
pub trait GroupGateway: Send + Sync {
    /// Create a group on the given messaging instance. NOT assumed
    /// idempotent upstream; implementations must not retry automatically.
    async fn create_group(
        &self,
        instance: &str,
        subject: &str,
        participants: &[String],
    ) -> Result<CreatedGroup>;

    /// Set the group photo. Best-effort from the engines' point of view.
    async fn set_group_photo(&self, instance: &str, group_id: &str, photo_url: &str) -> Result<()>;

    /// Set the group description. Best-effort.
    async fn set_group_description(
        &self,
        instance: &str,
        group_id: &str,
        description: &str,
    ) -> Result<()>;

    /// Set the group posting mode. Best-effort.
    async fn set_group_mode(&self, instance: &str, group_id: &str, mode: GroupMode) -> Result<()>;

    /// Fetch/mint the invite link for a group. Idempotent read upstream;
    /// implementations may apply [`RetryPolicy::IdempotentRead`].
    async fn create_invite(&self, instance: &str, group_id: &str) -> Result<InviteInfo>;

    /// Add one participant to a group. Required for admission; failure is
    /// fatal to the admission attempt and must not be retried automatically.
    async fn add_participant(&self, instance: &str, group_id: &str, phone: &str) -> Result<()>;

    /// Send a plain text message to a chat. Used for join acknowledgments;
    /// best-effort.
    async fn send_text_message(&self, instance: &str, to: &str, text: &str) -> Result<()>;
}
