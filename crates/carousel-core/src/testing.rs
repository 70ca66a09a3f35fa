// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scriptable gateway double for tests.
//!
//! Simulates the external group API without network I/O: configurable
//! responses, configurable failures per operation, and call counters so
//! tests can assert exactly how often each upstream endpoint was hit.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::gateway::{CreatedGroup, GatewayError, GroupGateway, GroupMode, InviteInfo, Result};

/// Scriptable in-memory [`GroupGateway`].
pub struct MockGateway {
    /// Response returned by `create_group`.
    pub created: CreatedGroup,
    /// Response returned by `create_invite`.
    pub invite: InviteInfo,
    /// When true, `create_group` fails.
    pub fail_create_group: bool,
    /// When true, `create_invite` fails.
    pub fail_create_invite: bool,
    /// When true, `add_participant` fails.
    pub fail_add_participant: bool,
    /// When true, the cosmetic calls (photo, description, mode) fail.
    pub fail_side_calls: bool,

    create_group_calls: AtomicUsize,
    create_invite_calls: AtomicUsize,
    add_participant_calls: AtomicUsize,
    side_calls: AtomicUsize,
    messages_sent: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// A gateway where every call succeeds with plausible defaults.
    pub fn new() -> Self {
        Self {
            created: CreatedGroup {
                id: Some("120363000000000001@g.us".to_string()),
                gid: None,
                size: Some(2),
            },
            invite: InviteInfo {
                invite_url: Some("https://chat.whatsapp.com/AbCdEfGh123".to_string()),
                url: None,
                code: None,
            },
            fail_create_group: false,
            fail_create_invite: false,
            fail_add_participant: false,
            fail_side_calls: false,
            create_group_calls: AtomicUsize::new(0),
            create_invite_calls: AtomicUsize::new(0),
            add_participant_calls: AtomicUsize::new(0),
            side_calls: AtomicUsize::new(0),
            messages_sent: AtomicUsize::new(0),
        }
    }

    /// A gateway whose `create_group` always fails.
    pub fn failing_create() -> Self {
        Self {
            fail_create_group: true,
            ..Self::new()
        }
    }

    /// A gateway whose `add_participant` always fails.
    pub fn failing_add() -> Self {
        Self {
            fail_add_participant: true,
            ..Self::new()
        }
    }

    /// A gateway that creates the group but cannot mint an invite.
    pub fn failing_invite() -> Self {
        Self {
            fail_create_invite: true,
            ..Self::new()
        }
    }

    /// How many times `create_group` was called.
    pub fn create_group_calls(&self) -> usize {
        self.create_group_calls.load(Ordering::SeqCst)
    }

    /// How many times `create_invite` was called.
    pub fn create_invite_calls(&self) -> usize {
        self.create_invite_calls.load(Ordering::SeqCst)
    }

    /// How many times `add_participant` was called.
    pub fn add_participant_calls(&self) -> usize {
        self.add_participant_calls.load(Ordering::SeqCst)
    }

    /// How many cosmetic calls (photo, description, mode) were made.
    pub fn side_calls(&self) -> usize {
        self.side_calls.load(Ordering::SeqCst)
    }

    /// How many acknowledgment messages were sent.
    pub fn messages_sent(&self) -> usize {
        self.messages_sent.load(Ordering::SeqCst)
    }

    fn upstream_error() -> GatewayError {
        GatewayError::Http {
            status: 500,
            body: "simulated upstream failure".to_string(),
        }
    }
}

#[async_trait]
impl GroupGateway for MockGateway {
    async fn create_group(
        &self,
        _instance: &str,
        _subject: &str,
        _participants: &[String],
    ) -> Result<CreatedGroup> {
        self.create_group_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_group {
            return Err(Self::upstream_error());
        }
        Ok(self.created.clone())
    }

    async fn set_group_photo(
        &self,
        _instance: &str,
        _group_id: &str,
        _photo_url: &str,
    ) -> Result<()> {
        self.side_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_side_calls {
            return Err(Self::upstream_error());
        }
        Ok(())
    }

    async fn set_group_description(
        &self,
        _instance: &str,
        _group_id: &str,
        _description: &str,
    ) -> Result<()> {
        self.side_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_side_calls {
            return Err(Self::upstream_error());
        }
        Ok(())
    }

    async fn set_group_mode(
        &self,
        _instance: &str,
        _group_id: &str,
        _mode: GroupMode,
    ) -> Result<()> {
        self.side_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_side_calls {
            return Err(Self::upstream_error());
        }
        Ok(())
    }

    async fn create_invite(&self, _instance: &str, _group_id: &str) -> Result<InviteInfo> {
        self.create_invite_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_invite {
            return Err(Self::upstream_error());
        }
        Ok(self.invite.clone())
    }

    async fn add_participant(&self, _instance: &str, _group_id: &str, _phone: &str) -> Result<()> {
        self.add_participant_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_add_participant {
            return Err(Self::upstream_error());
        }
        Ok(())
    }

    async fn send_text_message(&self, _instance: &str, _to: &str, _text: &str) -> Result<()> {
        self.messages_sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
