// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP routes: public join surface, webhook, internal rotation, health.

pub mod health;
pub mod join;
pub mod rotate;
pub mod webhook;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/join/{slug}", get(join::join_redirect))
        .route("/join/{slug}/page", get(join::join_page))
        .route("/webhook/gateway", post(webhook::gateway_webhook))
        .route(
            "/internal/join-pools/{slug}/rotate",
            post(rotate::rotate_pool),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
