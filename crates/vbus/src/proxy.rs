// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side proxies for remote elements (spec §4.4).

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::bus::{BusClient, SubscribeHandler};
use crate::error::{Result, VbusError};
use crate::path;

/// Which concrete proxy a raw JSON subtree represents, per the shape
/// discrimination rule in spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Attribute,
    Method,
}

pub fn discriminate(value: &Value) -> ElementKind {
    if value.get("params").is_some() && value.get("returns").is_some() {
        ElementKind::Method
    } else if value.get("schema").is_some() {
        ElementKind::Attribute
    } else {
        ElementKind::Node
    }
}

/// Discriminates a raw subtree (§3) into the concrete proxy it represents.
pub enum UnknownProxy {
    Node(NodeProxy),
    Attribute(AttributeProxy),
    Method(MethodProxy),
}

impl UnknownProxy {
    pub fn new(bus: Arc<BusClient>, path: String, cached: Value) -> Self {
        match discriminate(&cached) {
            ElementKind::Method => Self::Method(MethodProxy { bus, path }),
            ElementKind::Attribute => Self::Attribute(AttributeProxy { bus, path, cached }),
            ElementKind::Node => Self::Node(NodeProxy { bus, path, cached }),
        }
    }
}

/// A remote Node: iterates children from the cached subtree, falling back
/// to a `get` request on cache miss.
pub struct NodeProxy {
    bus: Arc<BusClient>,
    path: String,
    cached: Value,
}

impl NodeProxy {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw cached subtree.
    pub fn tree(&self) -> &Value {
        &self.cached
    }

    /// All `(name, raw-json)` pairs of the cached subtree.
    pub fn items(&self) -> Vec<(String, Value)> {
        object_entries(&self.cached)
    }

    pub fn attributes(&self) -> Vec<(String, Value)> {
        filter_by_kind(&self.cached, ElementKind::Attribute)
    }

    pub fn methods(&self) -> Vec<(String, Value)> {
        filter_by_kind(&self.cached, ElementKind::Method)
    }

    pub fn nodes(&self) -> Vec<(String, Value)> {
        filter_by_kind(&self.cached, ElementKind::Node)
    }

    fn child_path(&self, parts: &[&str]) -> String {
        let mut segments = vec![self.path.as_str()];
        segments.extend(parts);
        path::join(segments)
    }

    async fn resolve(&self, parts: &[&str], timeout: Duration) -> Result<Value> {
        if parts.iter().any(|p| path::is_wildcard(p)) {
            return Err(VbusError::Internal("wildcard segments are forbidden in get_node/get_method".to_owned()));
        }

        if let Some(cached) = self.cached.pointer(&json_pointer(parts)) {
            return Ok(cached.clone());
        }

        let full_path = self.child_path(parts);
        self.bus.request(&format!("{full_path}.get"), &Value::Null, timeout, false, false).await
    }

    pub async fn get_attribute(&self, parts: &[&str], timeout: Duration) -> Result<AttributeProxy> {
        let value = self.resolve(parts, timeout).await?;
        Ok(AttributeProxy { bus: self.bus.clone(), path: self.child_path(parts), cached: value })
    }

    pub async fn get_method(&self, parts: &[&str], _timeout: Duration) -> Result<MethodProxy> {
        if parts.iter().any(|p| path::is_wildcard(p)) {
            return Err(VbusError::Internal("wildcard segments are forbidden in get_node/get_method".to_owned()));
        }
        Ok(MethodProxy { bus: self.bus.clone(), path: self.child_path(parts) })
    }

    pub async fn get_node(&self, parts: &[&str], timeout: Duration) -> Result<NodeProxy> {
        let value = self.resolve(parts, timeout).await?;
        Ok(NodeProxy { bus: self.bus.clone(), path: self.child_path(parts), cached: value })
    }

    /// Install a callback firing on `<path>.<parts>.add`, delivering the
    /// added child wrapped as a [`NodeProxy`].
    pub async fn subscribe_add<F>(&self, parts: &[&str], callback: F) -> Result<tokio::task::JoinHandle<()>>
    where
        F: Fn(NodeProxy) + Send + Sync + 'static,
    {
        self.subscribe_event(parts, "add", callback).await
    }

    pub async fn subscribe_del<F>(&self, parts: &[&str], callback: F) -> Result<tokio::task::JoinHandle<()>>
    where
        F: Fn(NodeProxy) + Send + Sync + 'static,
    {
        self.subscribe_event(parts, "del", callback).await
    }

    async fn subscribe_event<F>(
        &self,
        parts: &[&str],
        event: &str,
        callback: F,
    ) -> Result<tokio::task::JoinHandle<()>>
    where
        F: Fn(NodeProxy) + Send + Sync + 'static,
    {
        let subject = path::join([self.child_path(parts).as_str(), event]);
        let bus = self.bus.clone();
        let base_path = self.child_path(parts);
        let callback = Arc::new(callback);
        let handler: SubscribeHandler = Arc::new(move |payload, _captures| {
            let bus = bus.clone();
            let base_path = base_path.clone();
            let callback = callback.clone();
            Box::pin(async move {
                if let Value::Object(map) = &payload {
                    for (uuid, rendered) in map {
                        let proxy = NodeProxy {
                            bus: bus.clone(),
                            path: path::join([base_path.as_str(), uuid.as_str()]),
                            cached: rendered.clone(),
                        };
                        callback(proxy);
                    }
                }
                None
            })
        });
        self.bus.subscribe(&subject, false, false, handler).await
    }
}

fn object_entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => Vec::new(),
    }
}

fn filter_by_kind(value: &Value, kind: ElementKind) -> Vec<(String, Value)> {
    object_entries(value).into_iter().filter(|(_, v)| discriminate(v) == kind).collect()
}

fn json_pointer(parts: &[&str]) -> String {
    if parts.is_empty() {
        return String::new();
    }
    format!("/{}", parts.join("/"))
}

/// A remote Attribute.
pub struct AttributeProxy {
    bus: Arc<BusClient>,
    path: String,
    cached: Value,
}

impl AttributeProxy {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn cached_value(&self) -> Option<&Value> {
        self.cached.get("value")
    }

    pub async fn set(&self, value: Value) -> Result<()> {
        self.bus.publish(&format!("{}.set", self.path), &value, false, false).await
    }

    pub async fn get_value(&self, in_cache: bool, timeout: Duration) -> Result<Value> {
        let payload = json!({"in_cache": in_cache});
        self.bus.request(&format!("{}.value.get", self.path), &payload, timeout, false, false).await
    }

    pub async fn subscribe_set<F>(&self, callback: F) -> Result<tokio::task::JoinHandle<()>>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let subject = format!("{}.value.set", self.path);
        let callback = Arc::new(callback);
        let handler: SubscribeHandler = Arc::new(move |payload, _captures| {
            let callback = callback.clone();
            Box::pin(async move {
                callback(payload);
                None
            })
        });
        self.bus.subscribe(&subject, false, false, handler).await
    }
}

/// A remote Method.
pub struct MethodProxy {
    bus: Arc<BusClient>,
    path: String,
}

impl MethodProxy {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Call the remote method with positional `args`, the static analogue of
    /// the original's dynamic `__getattr__`-based call wrapper.
    pub async fn call(&self, args: Vec<Value>, timeout: Duration) -> Result<Value> {
        self.bus.request(&format!("{}.set", self.path), &Value::Array(args), timeout, false, false).await
    }
}

/// Accepts `*` in its path; only subscribe operations are meaningful since a
/// wildcard subject cannot be `get`/`set` directly.
pub struct WildcardNodeProxy {
    bus: Arc<BusClient>,
    path: String,
}

impl WildcardNodeProxy {
    pub fn new(bus: Arc<BusClient>, path: String) -> Self {
        Self { bus, path }
    }

    pub async fn subscribe_add<F>(&self, callback: F) -> Result<tokio::task::JoinHandle<()>>
    where
        F: Fn(Vec<String>, Value) + Send + Sync + 'static,
    {
        self.subscribe_event("add", callback).await
    }

    pub async fn subscribe_del<F>(&self, callback: F) -> Result<tokio::task::JoinHandle<()>>
    where
        F: Fn(Vec<String>, Value) + Send + Sync + 'static,
    {
        self.subscribe_event("del", callback).await
    }

    async fn subscribe_event<F>(&self, event: &str, callback: F) -> Result<tokio::task::JoinHandle<()>>
    where
        F: Fn(Vec<String>, Value) + Send + Sync + 'static,
    {
        let subject = path::join([self.path.as_str(), event]);
        let callback = Arc::new(callback);
        let handler: SubscribeHandler = Arc::new(move |payload, captures| {
            let callback = callback.clone();
            Box::pin(async move {
                callback(captures, payload);
                None
            })
        });
        self.bus.subscribe(&subject, false, false, handler).await
    }
}

/// Accepts `*` in its path; only `subscribe_set` is meaningful.
pub struct WildcardAttrProxy {
    bus: Arc<BusClient>,
    path: String,
}

impl WildcardAttrProxy {
    pub fn new(bus: Arc<BusClient>, path: String) -> Self {
        Self { bus, path }
    }

    pub async fn subscribe_set<F>(&self, callback: F) -> Result<tokio::task::JoinHandle<()>>
    where
        F: Fn(Vec<String>, Value) + Send + Sync + 'static,
    {
        let subject = format!("{}.value.set", self.path);
        let callback = Arc::new(callback);
        let handler: SubscribeHandler = Arc::new(move |payload, captures| {
            let callback = callback.clone();
            Box::pin(async move {
                callback(captures, payload);
                None
            })
        });
        self.bus.subscribe(&subject, false, false, handler).await
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
