// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database liveness probe.

use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use carousel_core::store;

use crate::state::AppState;

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match store::health_check(&state.db).await {
        Ok(true) => (StatusCode::OK, "ok"),
        Ok(false) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        Err(err) => {
            warn!(error = %err, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
