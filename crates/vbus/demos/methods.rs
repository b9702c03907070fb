// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expose a remote-callable method and invoke it through a local proxy.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use vbus::schema::{MethodSchema, ParamSpec};
use vbus::Module;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").try_init().ok();

    let module = Module::new("system", "demo", None, None).await?;

    let scan = Arc::new(|args: Vec<Value>| {
        Box::pin(async move {
            let time = args.first().cloned().unwrap_or(Value::Null);
            tracing::info!(?time, "scanning");
            Ok(Value::Null)
        }) as vbus::element::BoxFuture<vbus::Result<Value>>
    });

    let schema = MethodSchema::new(&[ParamSpec { name: "time", json_type: "integer" }], "null");
    module.add_method(&[], "scan", scan, schema).await?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    let proxy = module.discover("system", "demo", Duration::from_secs(1), None).await?;
    let node = match proxy {
        vbus::proxy::UnknownProxy::Node(node) => node,
        _ => anyhow::bail!("expected the discovered subtree to be a node"),
    };
    let hostname = module.hostname().to_owned();
    let method = node.get_method(&[&hostname, "scan"], Duration::from_secs(1)).await?;
    method.call(vec![json!(60)], Duration::from_secs(1)).await?;

    Ok(())
}
