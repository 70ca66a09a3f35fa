// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared state for HTTP handlers.

use std::sync::Arc;

use sqlx::PgPool;

use carousel_core::admission::AdmissionEngine;
use carousel_core::gateway::GroupGateway;
use carousel_core::rotation::RotationEngine;

/// Shared state for all handlers.
///
/// The engines receive their dependencies here, once, at startup; handlers
/// only call them. Cloning is cheap (pool handle + Arcs).
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool, used directly by the read-only routes
    /// (join redirect, health).
    pub db: PgPool,
    /// Gateway used for webhook acknowledgment messages.
    pub gateway: Arc<dyn GroupGateway>,
    /// Rotation engine behind the internal rotate route.
    pub rotation: RotationEngine,
    /// Admission engine behind the webhook route.
    pub admission: AdmissionEngine,
    /// Shared secret expected in the `x-internal-token` header.
    pub internal_token: String,
    /// Keyword that triggers admission from an inbound message.
    pub join_keyword: String,
}

impl AppState {
    /// Wire up the handler state from its dependencies.
    pub fn new(
        db: PgPool,
        gateway: Arc<dyn GroupGateway>,
        internal_token: String,
        join_keyword: String,
    ) -> Self {
        let rotation = RotationEngine::new(db.clone(), gateway.clone());
        let admission = AdmissionEngine::new(db.clone(), gateway.clone());
        Self {
            db,
            gateway,
            rotation,
            admission,
            internal_token,
            join_keyword,
        }
    }
}
