// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pool and group records plus Postgres store operations.
//!
//! Records mirror the `group_pools` / `pool_groups` tables. Store operations
//! are free async functions: plain reads take a `&PgPool`, operations that
//! participate in the rotation/admission transactions take a
//! `&mut PgConnection` so they compose under one explicit transaction.

pub mod postgres;

pub use self::postgres::{
    activate_group, find_pool_by_slug, find_pool_for_instance, health_check,
    increment_member_count, insert_group, lock_group, lock_pool_by_slug, resolve_active_invite,
};

use chrono::{DateTime, Utc};

/// Group lifecycle status values as stored in the `group_status` enum.
pub mod group_status {
    /// The group currently accepts admissions.
    pub const ACTIVE: &str = "ACTIVE";
    /// The group reached capacity and was retired.
    pub const FULL: &str = "FULL";
}

/// A rotation pool: one campaign slug bound to one messaging instance and a
/// capacity threshold.
///
/// Pools are created by provisioning tooling and mutated only by the
/// rotation engine, which advances `next_sequence` and `current_group_id`
/// together in one transaction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PoolRecord {
    /// Database primary key.
    pub id: i64,
    /// Stable public identifier used in join links.
    pub slug: String,
    /// Human-readable campaign title; also the prefix of every group subject.
    pub title: String,
    /// External messaging instance that owns this pool's groups.
    pub instance_name: String,
    /// Maximum member count before a group stops admitting.
    pub capacity_threshold: i32,
    /// Phone numbers seeded into every newly created group. Group creation
    /// requires at least two.
    pub bootstrap_members: Vec<String>,
    /// Photo applied to every newly created group, if configured.
    pub photo_url: Option<String>,
    /// Description applied to every newly created group, if configured.
    pub description: Option<String>,
    /// The currently active group. Null only before the first rotation, or
    /// when tooling has retired the active group and no rotation ran yet.
    pub current_group_id: Option<i64>,
    /// Sequence number the next created group will take. Starts at 1,
    /// strictly increasing.
    pub next_sequence: i32,
    /// When the pool was created.
    pub created_at: DateTime<Utc>,
    /// When the pool was last mutated.
    pub updated_at: DateTime<Utc>,
}

/// One externally provisioned group belonging to a pool. Append-only
/// history: rows are never deleted by the core.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupRecord {
    /// Database primary key.
    pub id: i64,
    /// Owning pool.
    pub pool_id: i64,
    /// Value of the pool's `next_sequence` at creation time. Unique per
    /// pool, gapless in normal operation.
    pub sequence: i32,
    /// Upstream group identifier (JID).
    pub external_group_id: String,
    /// Canonical invite URL. Nullable only transiently during creation.
    pub invite_url: Option<String>,
    /// Locally tracked member count. Incremented on each successful
    /// admission; never reconciled against the platform's true membership;
    /// drift is a known, accepted limitation.
    pub member_count: i32,
    /// Lifecycle status (`ACTIVE` or `FULL`). Capacity is enforced at
    /// admission time regardless of this value.
    pub status: String,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
    /// When the group was last mutated.
    pub updated_at: DateTime<Utc>,
}

/// Resolved invite for the public join surface: the only data the redirect
/// page needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActiveInvite {
    /// Campaign title, shown on the landing page.
    pub title: String,
    /// Invite URL of the pool's active group.
    pub invite_url: String,
}
