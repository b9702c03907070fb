// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the vbus-gateway HTTP facade.
#[derive(Debug, Clone, clap::Args)]
pub struct GatewayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "VBUS_GATEWAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9800, env = "VBUS_GATEWAY_PORT")]
    pub port: u16,

    /// Domain used for the gateway's own bus identity (`<domain>.<app>`).
    #[arg(long, default_value = "system", env = "VBUS_GATEWAY_DOMAIN")]
    pub domain: String,

    /// App name used for the gateway's own bus identity.
    #[arg(long, default_value = "gateway", env = "VBUS_GATEWAY_APP")]
    pub app: String,

    /// Hub to bootstrap against; unset runs the full fallback chain.
    #[arg(long, env = "VBUS_GATEWAY_HUB_ID")]
    pub hub_id: Option<String>,

    /// Default discovery/scatter-gather window in milliseconds, used when a
    /// request doesn't specify `timeout_ms`.
    #[arg(long, default_value_t = 1000, env = "VBUS_GATEWAY_DEFAULT_TIMEOUT_MS")]
    pub default_timeout_ms: u64,
}

impl GatewayConfig {
    pub fn default_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.default_timeout_ms)
    }
}
