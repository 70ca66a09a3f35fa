// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rotation engine: guarantees a pool has an active group.
//!
//! One invocation is one database transaction. The pool row lock serializes
//! concurrent rotations per pool; after acquiring it the engine re-checks
//! whether a group is already active, so duplicate triggers are harmless
//! no-ops and at most one group is created per rotation under concurrent
//! load.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::RotationError;
use crate::gateway::{GroupGateway, GroupMode};
use crate::store::{self, GroupRecord};

/// Minimum number of bootstrap members a pool must seed into a new group.
const MIN_BOOTSTRAP_MEMBERS: usize = 2;

/// Outcome of [`RotationEngine::ensure_active_group`].
#[derive(Debug, Clone)]
pub enum RotationOutcome {
    /// The pool already had an active group; nothing was created.
    AlreadyActive,
    /// A fresh group was provisioned and activated.
    Created(GroupRecord),
}

impl RotationOutcome {
    /// Whether this invocation actually created a group.
    pub fn rotated(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Provisions and activates groups for pools.
///
/// Dependencies are explicit constructor parameters: the database pool and
/// the gateway the engine drives. Cloning is cheap (pool handle + Arc).
#[derive(Clone)]
pub struct RotationEngine {
    db: PgPool,
    gateway: Arc<dyn GroupGateway>,
}

impl RotationEngine {
    /// Create a rotation engine over the given database and gateway.
    pub fn new(db: PgPool, gateway: Arc<dyn GroupGateway>) -> Self {
        Self { db, gateway }
    }

    /// Ensure the pool identified by `slug` has an active group, creating
    /// one through the gateway if needed.
    ///
    /// On any error the transaction is rolled back whole: no partial group
    /// or pool mutation is ever persisted, and the entire call is safe to
    /// retry. Gateway calls that already happened are not compensated; a
    /// group created upstream with no local record is logged and left for
    /// manual reconciliation.
    pub async fn ensure_active_group(&self, slug: &str) -> Result<RotationOutcome, RotationError> {
        let mut tx = self.db.begin().await?;

        let Some(pool) = store::lock_pool_by_slug(&mut *tx, slug).await? else {
            return Err(RotationError::PoolNotFound {
                slug: slug.to_string(),
            });
        };

        // Re-check under the lock: a concurrent rotation may have won the
        // race while we were waiting for the row.
        if pool.current_group_id.is_some() {
            return Ok(RotationOutcome::AlreadyActive);
        }

        if pool.bootstrap_members.len() < MIN_BOOTSTRAP_MEMBERS {
            return Err(RotationError::InvalidPoolConfig {
                slug: slug.to_string(),
                reason: format!(
                    "{} bootstrap member(s), need at least {}",
                    pool.bootstrap_members.len(),
                    MIN_BOOTSTRAP_MEMBERS
                ),
            });
        }

        let subject = group_subject(&pool.title, pool.next_sequence);

        // Group creation is not idempotent upstream and is never retried
        // here; a failure aborts with the pool untouched.
        let created = self
            .gateway
            .create_group(&pool.instance_name, &subject, &pool.bootstrap_members)
            .await
            .map_err(|err| RotationError::ProvisioningFailed {
                slug: slug.to_string(),
                reason: format!("create_group: {err}"),
            })?;

        let Some(external_id) = created.external_id().map(str::to_string) else {
            return Err(RotationError::ProvisioningFailed {
                slug: slug.to_string(),
                reason: "create_group response carried no group identifier".to_string(),
            });
        };

        // Cosmetic provisioning must not block activation: the group is
        // usable for invites and admission without photo/description/mode.
        if let Some(photo_url) = &pool.photo_url {
            if let Err(err) = self
                .gateway
                .set_group_photo(&pool.instance_name, &external_id, photo_url)
                .await
            {
                warn!(slug, group = %external_id, error = %err, "failed to set group photo");
            }
        }

        if let Some(description) = &pool.description {
            if let Err(err) = self
                .gateway
                .set_group_description(&pool.instance_name, &external_id, description)
                .await
            {
                warn!(slug, group = %external_id, error = %err, "failed to set group description");
            }
        }

        if let Err(err) = self
            .gateway
            .set_group_mode(&pool.instance_name, &external_id, GroupMode::Announcement)
            .await
        {
            warn!(slug, group = %external_id, error = %err, "failed to set group mode");
        }

        // An active group with no invite link is useless to the public join
        // surface, so this step is required.
        let invite = self
            .gateway
            .create_invite(&pool.instance_name, &external_id)
            .await
            .map_err(|err| {
                warn!(
                    slug,
                    group = %external_id,
                    "abandoning provisioned group after invite failure; upstream group is orphaned"
                );
                RotationError::ProvisioningFailed {
                    slug: slug.to_string(),
                    reason: format!("create_invite: {err}"),
                }
            })?;

        let Some(invite_url) = invite.canonical_url() else {
            warn!(
                slug,
                group = %external_id,
                "abandoning provisioned group after invite failure; upstream group is orphaned"
            );
            return Err(RotationError::ProvisioningFailed {
                slug: slug.to_string(),
                reason: "invite response carried no usable link".to_string(),
            });
        };

        let group = store::insert_group(
            &mut *tx,
            pool.id,
            pool.next_sequence,
            &external_id,
            &invite_url,
            created.initial_size(),
        )
        .await?;

        store::activate_group(&mut *tx, pool.id, group.id, pool.next_sequence + 1).await?;

        tx.commit().await?;

        info!(
            slug,
            sequence = group.sequence,
            group = %group.external_group_id,
            "activated fresh group for pool"
        );

        Ok(RotationOutcome::Created(group))
    }
}

/// Human-readable subject for a new group: `"{title} #{sequence}"` with the
/// sequence zero-padded to two digits.
fn group_subject(title: &str, sequence: i32) -> String {
    format!("{title} #{sequence:02}")
}
