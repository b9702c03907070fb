// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! List every module currently announced on the bus.

use std::time::Duration;

use vbus::Module;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").try_init().ok();

    let module = Module::new("system", "client", None, None).await?;

    let modules = module.discover_modules(Duration::from_secs(1)).await?;
    for info in &modules {
        println!("{}", serde_json::to_string_pretty(info)?);
    }

    Ok(())
}
