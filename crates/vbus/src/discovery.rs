// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery: broadcast a request on a domain/app subject, aggregate replies
//! for a fixed window, merge into a single proxy (spec §4.5).
//!
//! A NATS "scatter-gather" request with an open-ended reply count, via a
//! manually published reply subject rather than `Client::request`'s
//! single-reply semantics.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};

use crate::bus::BusClient;
use crate::codec;
use crate::error::{Result, VbusError};
use crate::info::ModuleInfo;
use crate::proxy::UnknownProxy;

/// Broadcast on `<domain>.<app>`, shallow-merge every `{hostname: subtree}`
/// reply received within `timeout`, and return the merged tree as an
/// [`UnknownProxy`] rooted at `<domain>.<app>`.
pub async fn discover(
    bus: Arc<BusClient>,
    domain: &str,
    app: &str,
    timeout: Duration,
    level: Option<u32>,
) -> Result<UnknownProxy> {
    let subject = format!("{domain}.{app}");
    let payload = match level {
        Some(level) => json!({"max_level": level}),
        None => json!({}),
    };

    let merged = scatter_gather(&bus, &subject, &payload, timeout, merge_reply).await?;
    Ok(UnknownProxy::new(bus, subject, Value::Object(merged)))
}

fn merge_reply(acc: &mut serde_json::Map<String, Value>, reply: Value) {
    if let Value::Object(map) = reply {
        for (key, value) in map {
            acc.insert(key, value);
        }
    }
}

/// Broadcast on `info`, collect every module's self-description received
/// within `timeout` (spec §4.5).
pub async fn discover_modules(bus: Arc<BusClient>, timeout: Duration) -> Result<Vec<ModuleInfo>> {
    let mut modules = Vec::new();
    scatter_gather(&bus, "info", &Value::Null, timeout, |_acc: &mut (), reply| {
        if let Ok(info) = serde_json::from_value::<ModuleInfo>(reply) {
            modules.push(info);
        }
    })
    .await?;
    Ok(modules)
}

/// Publish `payload` to `subject` with a fresh inbox as the reply-to,
/// collecting decoded replies on that inbox via `fold` until `timeout`
/// elapses, then unsubscribing exactly once.
async fn scatter_gather<T, F>(bus: &BusClient, subject: &str, payload: &Value, timeout: Duration, mut fold: F) -> Result<T>
where
    T: Default,
    F: FnMut(&mut T, Value),
{
    let inbox = bus.new_inbox();
    let mut subscriber = bus.subscribe_raw(&inbox).await?;
    bus.publish_with_reply(subject, &inbox, payload).await?;

    let mut acc = T::default();
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, subscriber.next()).await {
            Ok(Some(message)) => {
                if let Ok(value) = codec::from_vbus(&message.payload) {
                    fold(&mut acc, value);
                }
            }
            Ok(None) | Err(_) => break,
        }
    }

    bus.unsubscribe_raw(&mut subscriber).await?;
    Ok(acc)
}
