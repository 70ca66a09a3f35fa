// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the rotation and admission engines.
//!
//! Expected admission outcomes (campaign not found, group full, ...) are NOT
//! errors; they live in [`crate::admission::RejectReason`]. The types here
//! cover the failures that abort a transaction.

use thiserror::Error;

/// Errors from [`crate::rotation::RotationEngine::ensure_active_group`].
///
/// Every variant implies the enclosing transaction was rolled back: no
/// partial pool or group mutation is ever persisted. External gateway calls
/// that already happened are not compensated; an orphaned upstream group is
/// an accepted failure mode, logged for manual reconciliation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RotationError {
    /// The slug does not identify an existing pool.
    #[error("pool not found: '{slug}'")]
    PoolNotFound {
        /// The campaign slug that did not resolve.
        slug: String,
    },

    /// The pool cannot provision groups as configured. Not retried
    /// automatically; the pool record must be fixed first.
    #[error("pool '{slug}' is misconfigured: {reason}")]
    InvalidPoolConfig {
        /// The campaign slug.
        slug: String,
        /// What is wrong with the pool record.
        reason: String,
    },

    /// Group creation or invite provisioning failed upstream. The whole
    /// `ensure_active_group` call is safe to retry.
    #[error("group provisioning failed for pool '{slug}': {reason}")]
    ProvisioningFailed {
        /// The campaign slug.
        slug: String,
        /// The upstream failure, including which provisioning step broke.
        reason: String,
    },

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RotationError {
    /// Machine-readable error code, used by the HTTP surface.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PoolNotFound { .. } => "POOL_NOT_FOUND",
            Self::InvalidPoolConfig { .. } => "INVALID_POOL_CONFIG",
            Self::ProvisioningFailed { .. } => "PROVISIONING_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Errors from [`crate::admission::AdmissionEngine::admit`].
///
/// Only infrastructure failures surface here; every expected outcome is a
/// [`crate::admission::AdmissionOutcome`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdmissionError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
