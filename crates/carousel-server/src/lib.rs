// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Carousel Server - HTTP surface for group pool rotation
//!
//! Routes:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /join/{slug}` | Public redirect to the active group's invite (ad links) |
//! | `GET /join/{slug}/page` | Lightweight landing page with button + auto-forward |
//! | `POST /webhook/gateway` | Inbound message events; turns join commands into admissions |
//! | `POST /internal/join-pools/{slug}/rotate` | Shared-secret rotation trigger |
//! | `GET /healthz` | Database liveness probe |
//!
//! The public join surface never fails outward: every internal problem
//! collapses to a single "temporarily unavailable" page. The webhook always
//! answers 200 so the upstream platform does not retry into a storm. All
//! real work happens in `carousel-core`'s engines; this crate is routing,
//! parsing and presentation.

pub mod config;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use state::AppState;
