// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-side subscriptions: describe, per-path get/set routing, and module
//! self-description (spec §4.3).

use std::sync::Arc;

use serde_json::Value;

use crate::bus::BusClient;
use crate::element::Element;
use crate::info::ModuleInfo;
use crate::path;
use crate::schema;
use crate::tree::Tree;

/// Holds the dispatcher's background subscription tasks; dropping/aborting
/// them tears the module down.
pub struct Dispatcher {
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl Dispatcher {
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }

    /// Install the three dispatcher subscriptions (spec §4.3): describe,
    /// per-path ops, and module info.
    pub async fn install(
        tree: Arc<Tree>,
        bus: Arc<BusClient>,
        client_user: String,
        has_static_files: bool,
    ) -> crate::error::Result<Self> {
        let mut tasks = Vec::new();

        tasks.push(install_describe(tree.clone(), bus.clone()).await?);
        tasks.push(install_per_path(tree.clone(), bus.clone()).await?);
        tasks.push(install_info(bus.clone(), client_user, has_static_files).await?);

        Ok(Self { tasks })
    }
}

async fn install_describe(tree: Arc<Tree>, bus: Arc<BusClient>) -> crate::error::Result<tokio::task::JoinHandle<()>> {
    let hostname = bus.hostname().to_owned();
    let handler: crate::bus::SubscribeHandler = Arc::new(move |payload, _captures| {
        let tree = tree.clone();
        let hostname = hostname.clone();
        Box::pin(async move {
            let max_level = payload.get("max_level").and_then(Value::as_u64).map(|n| n as u32);
            let rendered = tree.root_repr(max_level).await;
            let mut map = serde_json::Map::new();
            map.insert(hostname, rendered);
            Some(Value::Object(map))
        })
    });
    bus.subscribe("", true, false, handler).await
}

async fn install_per_path(tree: Arc<Tree>, bus: Arc<BusClient>) -> crate::error::Result<tokio::task::JoinHandle<()>> {
    let handler: crate::bus::SubscribeHandler = Arc::new(move |payload, captures| {
        let tree = tree.clone();
        Box::pin(async move {
            let Some(remainder) = captures.first() else {
                return Some(Element::not_found().to_repr());
            };
            let mut segments = path::split(remainder).iter().map(|s| s.to_string()).collect::<Vec<_>>();
            let Some(op) = segments.pop() else {
                return Some(Element::not_found().to_repr());
            };

            match op.as_str() {
                "get" => {
                    let in_cache = payload.get("in_cache").and_then(Value::as_bool).unwrap_or(false);
                    match tree.search_path(&segments).await {
                        Some(element) => Some(element.handle_get(&segments, in_cache).await),
                        None => Some(Element::not_found().to_repr()),
                    }
                }
                "set" => match tree.search_path(&segments).await {
                    // An attribute's set must validate against its schema and persist through
                    // `Tree::set_attribute_value` before anything else runs; `on_set` fires
                    // afterward as a side effect, not as what makes the value stick.
                    Some(Element::Attribute(attr)) => match schema::validate(&payload, &attr.schema) {
                        Ok(()) => match tree.set_attribute_value(&segments, payload.clone()).await {
                            Ok(()) => match &attr.on_set {
                                Some(on_set) => match on_set(payload, segments).await {
                                    Ok(value) => Some(value),
                                    Err(e) => Some(Element::from_error(&e).to_repr()),
                                },
                                None => Some(Value::Null),
                            },
                            Err(e) => Some(Element::from_error(&e).to_repr()),
                        },
                        Err(e) => Some(Element::from_error(&e).to_repr()),
                    },
                    Some(element) => match element.handle_set(payload, segments).await {
                        Ok(value) => Some(value),
                        Err(e) => Some(Element::from_error(&e).to_repr()),
                    },
                    None => Some(Element::not_found().to_repr()),
                },
                _ => Some(Element::not_found().to_repr()),
            }
        })
    });
    bus.subscribe(">", true, true, handler).await
}

async fn install_info(
    bus: Arc<BusClient>,
    client_user: String,
    has_static_files: bool,
) -> crate::error::Result<tokio::task::JoinHandle<()>> {
    let id = bus.id().to_owned();
    let hostname = bus.hostname().to_owned();
    let handler: crate::bus::SubscribeHandler = Arc::new(move |_payload, _captures| {
        let info = ModuleInfo::current(&id, &hostname, &client_user, has_static_files);
        Box::pin(async move { serde_json::to_value(&info).ok() })
    });
    bus.subscribe("info", false, false, handler).await
}
