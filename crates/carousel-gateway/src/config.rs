// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the gateway HTTP client.

use std::time::Duration;

/// Configuration for [`crate::HttpGroupGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the upstream API, e.g. `https://evolution.example.com`.
    pub base_url: String,
    /// API key sent as the `apikey` header on every request.
    pub api_key: String,
    /// Hard client-side timeout per request. Bounds how long the engines'
    /// transactions can hold row locks waiting on the upstream.
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8_000);

    /// Create a configuration with the default timeout.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
