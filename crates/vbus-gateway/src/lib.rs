// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vbus-gateway: a thin read-side HTTP facade over vBus discovery, fanning
//! one HTTP surface out over every module scattered across the bus.

pub mod config;
pub mod error;
pub mod state;
pub mod transport;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::state::GatewayState;
use crate::transport::build_router;

/// Run the gateway server until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = GatewayState::connect(config).await?;

    tracing::info!(id = state.module.id(), addr = %addr, "vbus-gateway listening");
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
