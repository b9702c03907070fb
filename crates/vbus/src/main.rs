// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "vbus", version, about = "Attach a module to the vBus and serve its element tree.")]
struct Cli {
    /// Module domain, e.g. "system".
    #[arg(long, env = "VBUS_DOMAIN")]
    domain: String,

    /// Module application name, e.g. "demo".
    #[arg(long, env = "VBUS_APP")]
    app: String,

    /// Hub to bootstrap against: an IP, a "<name>.local" mDNS hostname, or
    /// left unset to run the full fallback chain.
    #[arg(long, env = "VBUS_HUB_ID")]
    hub_id: Option<String>,

    /// Authenticate with an external NATS credentials file instead of a
    /// locally-issued identity; skips enrollment and permission negotiation.
    #[arg(long, env = "VBUS_CREDS_FILE")]
    creds_file: Option<String>,

    /// `text` or `json`.
    #[arg(long, env = "VBUS_LOG_FORMAT", default_value = "text")]
    log_format: String,
}

fn init_tracing(log_format: &str) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match log_format {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_format);

    let module = match vbus::Module::new(&cli.domain, &cli.app, cli.hub_id.as_deref(), cli.creds_file.as_deref()).await {
        Ok(module) => module,
        Err(e) => {
            error!("failed to bootstrap module: {e}");
            std::process::exit(1);
        }
    };

    info!(id = module.id(), host = module.hostname(), "module attached to vbus");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
    }
    info!("shutting down");
}
