// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level module: wires together configuration, the bus connection, the
//! local element tree, and the dispatcher.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::bus::{self, BusClient};
use crate::config::ModuleConfig;
use crate::dispatcher::Dispatcher;
use crate::discovery;
use crate::element::{GetCallback, MethodCallable, SetCallback};
use crate::error::Result;
use crate::permission;
use crate::proxy::UnknownProxy;
use crate::schema::MethodSchema;
use crate::tree::Tree;

fn default_config_root() -> PathBuf {
    std::env::var("VBUS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_owned());
            PathBuf::from(home).join("vbus")
        })
}

/// A connected module: `id = <domain>.<app>` attached to the bus under the
/// local `host`.
pub struct Module {
    id: String,
    bus: Arc<BusClient>,
    tree: Arc<Tree>,
    dispatcher: Option<Dispatcher>,
    config: ModuleConfig,
    config_root: PathBuf,
    creds_file: Option<String>,
}

impl Module {
    /// Bootstrap a module: load or create its config, connect to the bus,
    /// enroll if needed, and install the server-side dispatcher.
    ///
    /// `creds_file`, when set, is a NATS credentials file used to
    /// authenticate instead of a locally-issued identity. In that mode
    /// enrollment and permission assertion are both skipped: there is
    /// nothing local to enroll, and no controlling host is listening on the
    /// permission-ack subject to reply to.
    pub async fn new(domain: &str, app: &str, hub_id: Option<&str>, creds_file: Option<&str>) -> Result<Self> {
        let id = format!("{domain}.{app}");
        let hostname = hostname::get().ok().and_then(|h| h.into_string().ok()).unwrap_or_default();
        let config_root = default_config_root();

        let mut config = ModuleConfig::load_or_create(&config_root, &id, &hostname, creds_file)?;
        let bus = Arc::new(BusClient::connect(&id, &hostname, hub_id, creds_file, &mut config).await?);
        config.save(&config_root, &id)?;

        if creds_file.is_none() {
            bus::assert_permissions(&bus, &config).await?;
        }

        let tree = Arc::new(Tree::new(bus.clone()));
        let dispatcher =
            Dispatcher::install(tree.clone(), bus.clone(), config.client.user.clone(), false).await?;

        let creds_file = creds_file.map(str::to_owned);
        Ok(Self { id, bus, tree, dispatcher: Some(dispatcher), config, config_root, creds_file })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hostname(&self) -> &str {
        self.bus.hostname()
    }

    pub fn tree(&self) -> &Arc<Tree> {
        &self.tree
    }

    pub async fn add_node(&self, parent_parts: &[String], uuid: &str, initial: Value, on_set: Option<SetCallback>) -> Result<()> {
        self.tree.add_node(parent_parts, uuid, initial, on_set).await
    }

    pub async fn add_attribute(
        &self,
        parent_parts: &[String],
        uuid: &str,
        value: Option<Value>,
        on_set: Option<SetCallback>,
        on_get: Option<GetCallback>,
    ) -> Result<()> {
        self.tree.add_attribute(parent_parts, uuid, value, None, on_set, on_get).await
    }

    pub async fn add_method(
        &self,
        parent_parts: &[String],
        uuid: &str,
        callable: MethodCallable,
        schema: MethodSchema,
    ) -> Result<()> {
        self.tree.add_method(parent_parts, uuid, callable, schema).await
    }

    pub async fn discover(&self, domain: &str, app: &str, timeout: Duration, level: Option<u32>) -> Result<UnknownProxy> {
        discovery::discover(self.bus.clone(), domain, app, timeout, level).await
    }

    pub async fn discover_modules(&self, timeout: Duration) -> Result<Vec<crate::info::ModuleInfo>> {
        discovery::discover_modules(self.bus.clone(), timeout).await
    }

    /// Negotiate `path` into the module's permission set. Under external
    /// credentials this is a documented no-op: there is no controlling host
    /// to negotiate with under the new authentication system, so it warns
    /// and returns `false` without any bus traffic.
    pub async fn ask_permission(&mut self, path: &str) -> Result<bool> {
        if self.creds_file.is_some() {
            tracing::warn!(path, "no permission negotiation under external credentials");
            return Ok(false);
        }
        permission::ask_permission(&self.bus, &mut self.config, &self.config_root, path).await
    }

    /// Expose a URI under the root's `uris` node, using the discovered
    /// network IP when present, else the remote host (spec §4.7).
    pub async fn expose(&self, name: &str, protocol: &str, port: u16, path: Option<&str>) -> Result<()> {
        let host = self.config.vbus.network_ip.clone().unwrap_or_else(|| self.bus.hostname().to_owned());
        let path_suffix = path.map(|p| format!("/{p}")).unwrap_or_default();
        let uri = format!("{protocol}://{host}:{port}{path_suffix}");

        let uris_parent: Vec<String> = vec![];
        if self.tree.search_path(&["uris".to_owned()]).await.is_none() {
            self.tree.add_node(&uris_parent, "uris", Value::Object(Default::default()), None).await?;
        }
        self.tree
            .add_attribute(&["uris".to_owned()], name, Some(Value::String(uri)), None, None, None)
            .await
    }

    pub fn shutdown(&mut self) {
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.shutdown();
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_root.join(format!("{}.conf", self.id))
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.shutdown();
        }
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
