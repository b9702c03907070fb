// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission negotiation with the controlling host (spec §4.6).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::bus::BusClient;
use crate::config::ModuleConfig;
use crate::error::Result;

const PERMISSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Add `path` to the module's subscribe and publish permission lists if
/// absent, re-assert the updated set with the controlling host, and persist
/// the config on success. Idempotent: a path already present produces no
/// bus traffic.
pub async fn ask_permission(
    bus: &Arc<BusClient>,
    config: &mut ModuleConfig,
    config_root: &Path,
    path: &str,
) -> Result<bool> {
    let sub_present = config.client.permissions.subscribe.iter().any(|p| p == path);
    let pub_present = config.client.permissions.publish.iter().any(|p| p == path);

    if sub_present && pub_present {
        return Ok(true);
    }

    if !sub_present {
        config.client.permissions.subscribe.push(path.to_owned());
    }
    if !pub_present {
        config.client.permissions.publish.push(path.to_owned());
    }

    let remote_host = bus.remote_hostname().await.unwrap_or_else(|| bus.hostname().to_owned());
    let subject =
        format!("system.authorization.{remote_host}.{}.{}.permissions.set", bus.id(), bus.hostname());

    let reply = bus
        .request(&subject, &config.client.permissions, PERMISSION_TIMEOUT, false, false)
        .await?;

    let ok = !matches!(reply, serde_json::Value::Null | serde_json::Value::Bool(false));
    if ok {
        config.save(config_root, bus.id())?;
    }
    Ok(ok)
}
