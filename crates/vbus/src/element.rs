// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory element definitions: Node, Attribute, Method, Error, AsyncNode.
//!
//! Each variant answers `to_repr`, `search_path`, `handle_set`, `handle_get`
//! (spec §4.2).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::{Result, VbusError};
use crate::schema::MethodSchema;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Invoked on `set`: receives the decoded payload and the path parts past
/// the element, returns the value to echo back (if any).
pub type SetCallback = Arc<dyn Fn(Value, Vec<String>) -> BoxFuture<Result<Value>> + Send + Sync>;

/// Invoked on `get` of `<attr>.value` when no cached value answers the
/// request.
pub type GetCallback = Arc<dyn Fn() -> BoxFuture<Value> + Send + Sync>;

/// A method's callable: receives positional arguments unpacked from the
/// request's array payload.
pub type MethodCallable = Arc<dyn Fn(Vec<Value>) -> BoxFuture<Result<Value>> + Send + Sync>;

/// Produces a fresh Node on every access; must never cache its result.
pub type NodeProducer = Arc<dyn Fn() -> Element + Send + Sync>;

#[derive(Clone)]
pub struct NodeData {
    pub children: IndexMap<String, Element>,
    pub on_set: Option<SetCallback>,
}

#[derive(Clone)]
pub struct AttributeData {
    pub uuid: String,
    pub value: Option<Value>,
    pub schema: Value,
    pub on_set: Option<SetCallback>,
    pub on_get: Option<GetCallback>,
}

#[derive(Clone)]
pub struct MethodData {
    pub callable: MethodCallable,
    pub schema: MethodSchema,
}

#[derive(Clone)]
pub struct ErrorData {
    pub code: u16,
    pub message: String,
    pub detail: Option<String>,
}

#[derive(Clone)]
pub struct AsyncNodeData {
    pub producer: NodeProducer,
}

#[derive(Clone)]
pub enum Element {
    Node(NodeData),
    Attribute(AttributeData),
    Method(MethodData),
    Error(ErrorData),
    AsyncNode(AsyncNodeData),
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(n) => f.debug_struct("Node").field("children", &n.children.keys().collect::<Vec<_>>()).finish(),
            Self::Attribute(a) => f.debug_struct("Attribute").field("uuid", &a.uuid).field("value", &a.value).finish(),
            Self::Method(_) => f.write_str("Method(..)"),
            Self::Error(e) => f.debug_struct("Error").field("code", &e.code).field("message", &e.message).finish(),
            Self::AsyncNode(_) => f.write_str("AsyncNode(..)"),
        }
    }
}

impl Element {
    pub fn empty_node() -> Self {
        Self::Node(NodeData { children: IndexMap::new(), on_set: None })
    }

    pub fn attribute(uuid: impl Into<String>, value: Option<Value>, schema: Value) -> Self {
        Self::Attribute(AttributeData { uuid: uuid.into(), value, schema, on_set: None, on_get: None })
    }

    pub fn error(code: u16, message: impl Into<String>, detail: Option<String>) -> Self {
        Self::Error(ErrorData { code, message: message.into(), detail })
    }

    pub fn not_found() -> Self {
        Self::error(404, "not found", None)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::error(500, "internal server error", Some(detail.into()))
    }

    /// The wire-level `Error` element for `error`, via [`VbusError::to_wire`].
    pub fn from_error(error: &VbusError) -> Self {
        let wire = error.to_wire();
        Self::error(wire.code, wire.message, wire.detail)
    }

    /// JSON rendering, spec §3.
    pub fn to_repr(&self) -> Value {
        match self {
            Self::Node(n) => {
                let mut map = serde_json::Map::new();
                for (uuid, child) in &n.children {
                    map.insert(uuid.clone(), child.to_repr());
                }
                Value::Object(map)
            }
            Self::Attribute(a) => {
                let mut map = serde_json::Map::new();
                map.insert("schema".to_owned(), a.schema.clone());
                if let Some(v) = &a.value {
                    map.insert("value".to_owned(), v.clone());
                }
                Value::Object(map)
            }
            Self::Method(m) => m.schema.to_json(),
            Self::Error(e) => {
                let mut map = serde_json::Map::new();
                map.insert("code".to_owned(), json!(e.code));
                map.insert("message".to_owned(), json!(e.message));
                if let Some(d) = &e.detail {
                    map.insert("detail".to_owned(), json!(d));
                }
                Value::Object(map)
            }
            Self::AsyncNode(a) => (a.producer)().to_repr(),
        }
    }

    /// Render with children beyond depth `max_level` collapsed to the
    /// literal string `"..."`, as used by the describe subject (spec §4.3).
    pub fn to_repr_pruned(&self, max_level: Option<u32>) -> Value {
        self.to_repr_pruned_at(max_level, 0)
    }

    fn to_repr_pruned_at(&self, max_level: Option<u32>, depth: u32) -> Value {
        match self {
            Self::Node(n) => {
                if let Some(limit) = max_level {
                    if depth > limit {
                        return Value::String("...".to_owned());
                    }
                }
                let mut map = serde_json::Map::new();
                for (uuid, child) in &n.children {
                    map.insert(uuid.clone(), child.to_repr_pruned_at(max_level, depth + 1));
                }
                Value::Object(map)
            }
            Self::AsyncNode(a) => (a.producer)().to_repr_pruned_at(max_level, depth),
            other => other.to_repr(),
        }
    }

    /// Returns the element at `parts`, cloned, or `None` if it doesn't
    /// resolve. Node descends by first segment; Attribute accepts empty or
    /// `["value"]`; Method/Error accept only empty.
    pub fn search_path(&self, parts: &[String]) -> Option<Element> {
        match self {
            Self::Node(n) => match parts.split_first() {
                None => Some(self.clone()),
                Some((head, rest)) => n.children.get(head)?.search_path(rest),
            },
            Self::Attribute(_) => match parts {
                [] => Some(self.clone()),
                [only] if only == "value" => Some(self.clone()),
                _ => None,
            },
            Self::Method(_) | Self::Error(_) => {
                if parts.is_empty() {
                    Some(self.clone())
                } else {
                    None
                }
            }
            Self::AsyncNode(a) => (a.producer)().search_path(parts),
        }
    }

    /// Handle an incoming `set`.
    pub async fn handle_set(&self, data: Value, parts: Vec<String>) -> Result<Value> {
        match self {
            Self::Node(n) => match &n.on_set {
                Some(cb) => cb(data, parts).await,
                None => Err(VbusError::Internal("node has no set handler".to_owned())),
            },
            Self::Attribute(a) => match &a.on_set {
                Some(cb) => cb(data, parts).await,
                None => Ok(Value::Null),
            },
            Self::Method(m) => {
                let args = match data {
                    Value::Array(items) => items,
                    _ => Vec::new(),
                };
                (m.callable)(args).await
            }
            Self::Error(_) => Err(VbusError::Internal("cannot set an error element".to_owned())),
            Self::AsyncNode(a) => Box::pin((a.producer)().handle_set(data, parts)).await,
        }
    }

    /// Handle an incoming `get`. `in_cache` mirrors the request payload flag
    /// that short-circuits an attribute's `on_get`.
    pub async fn handle_get(&self, parts: &[String], in_cache: bool) -> Value {
        if let Self::Attribute(a) = self {
            if parts.last().map(String::as_str) == Some("value") {
                if in_cache {
                    return a.value.clone().unwrap_or(Value::Null);
                }
                if let Some(cb) = &a.on_get {
                    return cb().await;
                }
                return a.value.clone().unwrap_or(Value::Null);
            }
        }
        self.to_repr()
    }
}

#[cfg(test)]
#[path = "element_tests.rs"]
mod tests;
