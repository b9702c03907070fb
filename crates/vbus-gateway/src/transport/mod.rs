// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the vbus-gateway facade.

pub mod http;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::state::GatewayState;

/// Build the axum `Router` with all gateway routes.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::health))
        .route("/api/v1/discover", get(http::discover))
        .route("/api/v1/modules", get(http::modules))
        .with_state(state)
}
