// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Carousel Gateway - HTTP client for the external group API
//!
//! Implements [`carousel_core::gateway::GroupGateway`] over an
//! Evolution-compatible HTTP API: group creation, cosmetic updates, invite
//! codes, participant management, and text messages.
//!
//! Every request carries the instance API key and a hard client-side
//! timeout; the engines call this client from inside open database
//! transactions, so an unbounded request would turn into an unbounded row
//! lock. Only the invite lookup is retried automatically (it is a GET
//! upstream); creation and mutation endpoints surface their first failure.
//!
//! # Example
//!
//! ```no_run
//! use carousel_gateway::{GatewayConfig, HttpGroupGateway};
//!
//! # fn example() -> Result<(), carousel_core::gateway::GatewayError> {
//! let config = GatewayConfig::new("https://evolution.example.com", "secret-api-key");
//! let gateway = HttpGroupGateway::new(config)?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;

pub use client::HttpGroupGateway;
pub use config::GatewayConfig;
