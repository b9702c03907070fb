// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Add a node with nested attributes and a method, then read one back.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use vbus::Module;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").try_init().ok();

    let module = Module::new("system", "demo", None, None).await?;
    tracing::info!(id = module.id(), host = module.hostname(), "connected");

    let on_attribute_write = Arc::new(|value: serde_json::Value, path: Vec<String>| {
        Box::pin(async move {
            tracing::info!(?path, ?value, "attribute written");
            Ok(value)
        }) as vbus::element::BoxFuture<vbus::Result<serde_json::Value>>
    });

    module
        .add_node(
            &[],
            "00:45:25:65:25:ff",
            json!({
                "name": "sensor",
                "tuning": [1, 2, 3],
            }),
            None,
        )
        .await?;

    module
        .add_attribute(
            &["00:45:25:65:25:ff".to_owned()],
            "temperature",
            Some(json!(21.5)),
            Some(on_attribute_write),
            None,
        )
        .await?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    let tree = module.tree().root_repr(None).await;
    println!("{}", serde_json::to_string_pretty(&tree)?);

    Ok(())
}
