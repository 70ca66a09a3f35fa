// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Admission engine: adds one requester to a pool's active group.
//!
//! One invocation is one database transaction. The active group row is
//! locked before the capacity check, so the check and the member-count
//! increment are linearized: two concurrent admissions can never both pass
//! the threshold and overshoot it.
//!
//! Admission never rotates. A burst of join attempts against a full group
//! produces `GroupFull` rejections, not concurrent rotation storms; rotation
//! is triggered out of band.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::AdmissionError;
use crate::gateway::GroupGateway;
use crate::store;

/// Why an admission attempt was rejected. Expected, non-exceptional
/// outcomes; the caller turns them into user-facing acknowledgments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No pool matches the campaign slug / instance.
    CampaignNotFound,
    /// The pool has no active group right now; the caller may trigger a
    /// rotation and retry.
    NoActiveGroup,
    /// The pool references a group that is missing or no longer ACTIVE.
    ActiveGroupMissing,
    /// The active group is at capacity.
    GroupFull,
    /// The upstream participant-add call failed; no member count was
    /// recorded and the caller may retry.
    GatewayAddFailed,
}

impl RejectReason {
    /// Machine-readable reason code.
    pub fn code(self) -> &'static str {
        match self {
            Self::CampaignNotFound => "CAMPAIGN_NOT_FOUND",
            Self::NoActiveGroup => "NO_ACTIVE_GROUP",
            Self::ActiveGroupMissing => "ACTIVE_GROUP_MISSING",
            Self::GroupFull => "GROUP_FULL",
            Self::GatewayAddFailed => "GATEWAY_ADD_FAILED",
        }
    }
}

/// Outcome of [`AdmissionEngine::admit`].
#[derive(Debug, Clone)]
pub enum AdmissionOutcome {
    /// The requester was added to the active group and the member count
    /// recorded.
    Admitted {
        /// External identifier of the group the requester joined.
        external_group_id: String,
        /// Title of the pool, for user-facing acknowledgments.
        pool_title: String,
    },
    /// The requester was not added.
    Rejected(RejectReason),
}

impl AdmissionOutcome {
    /// Whether the requester ended up in the group.
    pub fn admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Admits join requests against pools' active groups.
#[derive(Clone)]
pub struct AdmissionEngine {
    db: PgPool,
    gateway: Arc<dyn GroupGateway>,
}

impl AdmissionEngine {
    /// Create an admission engine over the given database and gateway.
    pub fn new(db: PgPool, gateway: Arc<dyn GroupGateway>) -> Self {
        Self { db, gateway }
    }

    /// Try to admit `phone` into the active group of the pool resolved from
    /// `instance` and the optional `campaign` slug.
    ///
    /// Every expected outcome is a typed [`AdmissionOutcome`]; only
    /// infrastructure failures surface as errors. On every non-admitted
    /// path the transaction rolls back and no member count changes.
    pub async fn admit(
        &self,
        instance: &str,
        phone: &str,
        campaign: Option<&str>,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        let mut tx = self.db.begin().await?;

        let Some(pool) = store::find_pool_for_instance(&mut *tx, instance, campaign).await? else {
            return Ok(AdmissionOutcome::Rejected(RejectReason::CampaignNotFound));
        };

        let Some(group_id) = pool.current_group_id else {
            return Ok(AdmissionOutcome::Rejected(RejectReason::NoActiveGroup));
        };

        // Lock the group row: from here to commit, capacity checks for this
        // group are serialized.
        let Some(group) = store::lock_group(&mut *tx, group_id).await? else {
            return Ok(AdmissionOutcome::Rejected(RejectReason::ActiveGroupMissing));
        };

        if group.member_count >= pool.capacity_threshold {
            return Ok(AdmissionOutcome::Rejected(RejectReason::GroupFull));
        }

        if let Err(err) = self
            .gateway
            .add_participant(instance, &group.external_group_id, phone)
            .await
        {
            warn!(
                slug = %pool.slug,
                group = %group.external_group_id,
                error = %err,
                "participant add failed upstream; admission rolled back"
            );
            return Ok(AdmissionOutcome::Rejected(RejectReason::GatewayAddFailed));
        }

        store::increment_member_count(&mut *tx, group.id).await?;
        tx.commit().await?;

        info!(
            slug = %pool.slug,
            group = %group.external_group_id,
            members = group.member_count + 1,
            "admitted participant into active group"
        );

        Ok(AdmissionOutcome::Admitted {
            external_group_id: group.external_group_id,
            pool_title: pool.title,
        })
    }
}
