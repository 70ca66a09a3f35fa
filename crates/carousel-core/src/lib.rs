// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Carousel Core - Group Pool Rotation and Admission Engine
//!
//! This crate implements the transactional heart of carousel: pools of
//! membership-limited messaging groups published behind a stable campaign
//! slug. When a pool has no active group, the rotation engine provisions a
//! fresh one through the external group gateway and activates it atomically.
//! Join requests are admitted against the active group's capacity, one row
//! lock at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      carousel-server                        │
//! │     (join redirects, inbound webhook, internal rotate)      │
//! └─────────────────────────────────────────────────────────────┘
//!            │                    │                  │
//!            ▼                    ▼                  ▼
//! ┌──────────────────┐ ┌──────────────────┐ ┌────────────────────┐
//! │  RotationEngine  │ │ AdmissionEngine  │ │ resolve_active_    │
//! │  (this crate)    │ │  (this crate)    │ │ invite (read path) │
//! └──────────────────┘ └──────────────────┘ └────────────────────┘
//!            │                    │                  │
//!            │   Arc<dyn GroupGateway>               │
//!            ▼                    ▼                  │
//! ┌──────────────────────────────────────┐          │
//! │       External group gateway         │          │
//! │  (create group, invites, add member) │          │
//! └──────────────────────────────────────┘          │
//!            │                    │                  │
//!            ▼                    ▼                  ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        PostgreSQL                           │
//! │              group_pools / pool_groups tables               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Concurrency model
//!
//! There is no in-process mutual exclusion. All safety comes from row-level
//! transactional locking in the store:
//!
//! - rotation locks the pool row (`SELECT ... FOR UPDATE`) and re-checks the
//!   active group after acquiring the lock, so concurrent rotation triggers
//!   for one pool collapse to a single created group;
//! - admission locks the active group row, so the capacity check and the
//!   member-count increment are linearized and the threshold is never
//!   exceeded;
//! - different pools rotate and admit fully in parallel.
//!
//! Gateway calls execute inside the open transaction and hold the row lock
//! for their duration; the gateway client's request timeout bounds the
//! worst-case hold time.
//!
//! # Modules
//!
//! - [`store`]: pool/group records and Postgres store operations
//! - [`gateway`]: the external group-provisioning contract
//! - [`rotation`]: the rotation engine (`ensure_active_group`)
//! - [`admission`]: the admission engine (`admit`)
//! - [`error`]: typed error taxonomy for both engines
//! - [`migrations`]: embedded database migrations
//! - [`testing`]: a scriptable in-memory gateway for tests

#![deny(missing_docs)]

/// Admission engine: capacity-checked participant admission.
pub mod admission;

/// Error types for rotation and admission operations.
pub mod error;

/// External group-provisioning gateway contract.
pub mod gateway;

/// Embedded database migrations.
pub mod migrations;

/// Rotation engine: active-group provisioning and pool advancement.
pub mod rotation;

/// Pool and group records plus Postgres store operations.
pub mod store;

/// Test doubles for the gateway contract.
pub mod testing;

pub use admission::{AdmissionEngine, AdmissionOutcome, RejectReason};
pub use error::{AdmissionError, RotationError};
pub use gateway::{CreatedGroup, GatewayError, GroupGateway, GroupMode, InviteInfo, RetryPolicy};
pub use rotation::{RotationEngine, RotationOutcome};
