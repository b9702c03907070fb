// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The module's local element tree: a rooted Node, mutated only through this
//! public API, publishing `add`/`del`/`value.set` notifications as it goes
//! (spec §4.3).

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::bus::BusClient;
use crate::element::{AttributeData, Element, GetCallback, MethodCallable, MethodData, NodeData, SetCallback};
use crate::error::Result;
use crate::path;
use crate::schema::{infer_schema, MethodSchema};

/// Owns the root [`Element::Node`] behind a shared `Arc<RwLock<...>>` rather
/// than confining mutation to a single task (spec §5 names either valid).
#[derive(Clone)]
pub struct Tree {
    root: Arc<RwLock<Element>>,
    bus: Arc<BusClient>,
}

impl Tree {
    pub fn new(bus: Arc<BusClient>) -> Self {
        Self { root: Arc::new(RwLock::new(Element::empty_node())), bus }
    }

    pub async fn root_repr(&self, max_level: Option<u32>) -> Value {
        self.root.read().await.to_repr_pruned(max_level)
    }

    /// Locally resolve `parts` against the root, without going over the bus.
    pub async fn search_path(&self, parts: &[String]) -> Option<Element> {
        self.root.read().await.search_path(parts)
    }

    /// Add a child node under `parent_parts` (empty for the root), publishing
    /// `add` on success.
    pub async fn add_node(
        &self,
        parent_parts: &[String],
        uuid: &str,
        initial: Value,
        on_set: Option<SetCallback>,
    ) -> Result<()> {
        let mut children = IndexMap::new();
        if let Value::Object(map) = initial {
            for (key, value) in map {
                let schema = infer_schema(&value);
                children.insert(key.clone(), Element::attribute(key, Some(value), schema));
            }
        }
        let node = Element::Node(NodeData { children, on_set });
        self.insert(parent_parts, uuid, node).await
    }

    pub async fn add_attribute(
        &self,
        parent_parts: &[String],
        uuid: &str,
        value: Option<Value>,
        schema: Option<Value>,
        on_set: Option<SetCallback>,
        on_get: Option<GetCallback>,
    ) -> Result<()> {
        let schema = schema.unwrap_or_else(|| infer_schema(value.as_ref().unwrap_or(&Value::Null)));
        let attr = Element::Attribute(AttributeData {
            uuid: uuid.to_owned(),
            value,
            schema,
            on_set,
            on_get,
        });
        self.insert(parent_parts, uuid, attr).await
    }

    pub async fn add_method(
        &self,
        parent_parts: &[String],
        uuid: &str,
        callable: MethodCallable,
        schema: MethodSchema,
    ) -> Result<()> {
        let method = Element::Method(MethodData { callable, schema });
        self.insert(parent_parts, uuid, method).await
    }

    async fn insert(&self, parent_parts: &[String], uuid: &str, element: Element) -> Result<()> {
        let uuid = path::sanitize_segment(uuid);
        let rendered = {
            let mut root = self.root.write().await;
            insert_child(&mut root, parent_parts, &uuid, element.clone())?;
            element.to_repr()
        };

        let parent_path = path::join(parent_parts.iter().map(String::as_str));
        let add_subject = path::join([parent_path.as_str(), "add"]);
        let payload = json!({ uuid: rendered });
        self.bus.publish(&add_subject, &payload, true, true).await
    }

    /// Remove `uuid` from under `parent_parts`, publishing `del` on success.
    pub async fn remove_element(&self, parent_parts: &[String], uuid: &str) -> Result<()> {
        let uuid = path::sanitize_segment(uuid);
        let rendered = {
            let mut root = self.root.write().await;
            remove_child(&mut root, parent_parts, &uuid)
        };

        let Some(rendered) = rendered else { return Ok(()) };

        let parent_path = path::join(parent_parts.iter().map(String::as_str));
        let del_subject = path::join([parent_path.as_str(), "del"]);
        let payload = json!({ uuid: rendered });
        self.bus.publish(&del_subject, &payload, true, true).await
    }

    /// Set an attribute's cached value and publish `<attr-path>.value.set`.
    pub async fn set_attribute_value(&self, attr_parts: &[String], value: Value) -> Result<()> {
        {
            let mut root = self.root.write().await;
            set_attribute_value(&mut root, attr_parts, value.clone());
        }
        let path = path::join(attr_parts.iter().map(String::as_str));
        let subject = path::join([path.as_str(), "value", "set"]);
        self.bus.publish(&subject, &value, true, true).await
    }
}

fn insert_child(root: &mut Element, parent_parts: &[String], uuid: &str, child: Element) -> Result<()> {
    let parent = resolve_node_mut(root, parent_parts)?;
    if let Element::Node(data) = parent {
        data.children.insert(uuid.to_owned(), child);
    }
    Ok(())
}

fn remove_child(root: &mut Element, parent_parts: &[String], uuid: &str) -> Option<Value> {
    let parent = resolve_node_mut(root, parent_parts).ok()?;
    if let Element::Node(data) = parent {
        return data.children.shift_remove(uuid).map(|e| e.to_repr());
    }
    None
}

fn set_attribute_value(root: &mut Element, attr_parts: &[String], value: Value) {
    let Some((uuid, parent_parts)) = attr_parts.split_last() else { return };
    if let Ok(Element::Node(data)) = resolve_node_mut(root, parent_parts) {
        if let Some(Element::Attribute(attr)) = data.children.get_mut(uuid) {
            attr.value = Some(value);
        }
    }
}

fn resolve_node_mut<'a>(root: &'a mut Element, parts: &[String]) -> Result<&'a mut Element> {
    let mut current = root;
    for part in parts {
        match current {
            Element::Node(data) => {
                current = data
                    .children
                    .entry(part.clone())
                    .or_insert_with(Element::empty_node);
            }
            _ => return Ok(current),
        }
    }
    Ok(current)
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
