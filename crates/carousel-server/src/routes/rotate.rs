// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Internal rotation trigger, guarded by a shared-secret header.
//!
//! Transport-level authorization only: the header must match the configured
//! token, and the caller is then trusted. The rotation engine itself does
//! the real work and stays idempotent under duplicate triggers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use carousel_core::error::RotationError;

use crate::state::AppState;

/// Header carrying the internal shared secret.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// `POST /internal/join-pools/{slug}/rotate`
pub async fn rotate_pool(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = headers
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    if token != Some(state.internal_token.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    match state.rotation.ensure_active_group(&slug).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "rotated": outcome.rotated() })),
        )
            .into_response(),
        Err(err) => {
            let status = match &err {
                RotationError::PoolNotFound { .. } => StatusCode::NOT_FOUND,
                RotationError::InvalidPoolConfig { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                RotationError::ProvisioningFailed { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error!(slug = %slug, code = err.error_code(), error = %err, "rotation failed");
            (
                status,
                Json(json!({ "error": err.error_code(), "message": err.to_string() })),
            )
                .into_response()
        }
    }
}
