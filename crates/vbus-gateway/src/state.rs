// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use vbus::Module;

use crate::config::GatewayConfig;

/// Shared state for the HTTP facade: the gateway's own module (used only to
/// issue `discover`/`discover_modules` scatter-gathers, never to expose a
/// tree of its own) plus request-default settings.
pub struct GatewayState {
    pub module: Module,
    pub config: GatewayConfig,
}

impl GatewayState {
    pub async fn connect(config: GatewayConfig) -> anyhow::Result<Arc<Self>> {
        let module = Module::new(&config.domain, &config.app, config.hub_id.as_deref(), None).await?;
        Ok(Arc::new(Self { module, config }))
    }
}
