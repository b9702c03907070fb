// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk module configuration: client credentials, bus permissions, and
//! the last-known bus URL/hostname. Writes go through a temp-file-then-
//! rename to keep a crash from leaving a half-written config on disk.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VbusError};

const BCRYPT_COST: u32 = 11;
const PASSWORD_LEN: usize = 22;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permissions {
    pub subscribe: Vec<String>,
    pub publish: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub user: String,
    pub password: String,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    pub private: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VbusLocation {
    pub url: Option<String>,
    pub hostname: Option<String>,
    #[serde(rename = "networkIp")]
    pub network_ip: Option<String>,
}

impl Default for VbusLocation {
    fn default() -> Self {
        Self { url: None, hostname: None, network_ip: None }
    }
}

/// The "v2" configuration shape used when a module connects with an
/// external NATS credentials file: just the bus location, no locally-issued
/// client/key block since the creds file carries its own identity.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VbusOnlyConfig {
    pub vbus: VbusLocation,
}

/// A module's persisted configuration file, `<id>.conf` under the module's
/// root folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub client: ClientConfig,
    pub key: KeyConfig,
    pub vbus: VbusLocation,
}

impl ModuleConfig {
    fn validate(&self) -> bool {
        !self.client.user.is_empty() && !self.client.password.is_empty() && !self.key.private.is_empty()
    }

    /// A placeholder client/key block for the external-credentials path:
    /// the creds file authenticates the connection, so nothing here is ever
    /// read for that purpose. `permissions` still tracks what
    /// [`crate::permission::ask_permission`] has negotiated locally, even
    /// though under external credentials that negotiation is a no-op.
    fn from_vbus_only(v2: VbusOnlyConfig) -> Self {
        Self {
            client: ClientConfig {
                user: String::new(),
                password: String::new(),
                permissions: Permissions { subscribe: Vec::new(), publish: Vec::new() },
            },
            key: KeyConfig { private: String::new() },
            vbus: v2.vbus,
        }
    }

    /// Build a fresh default config for `id`, generating a random password
    /// and its bcrypt hash the way the original module bootstrap does.
    pub fn generate(id: &str, hostname: &str) -> Result<Self> {
        let password = generate_password();
        let hashed = bcrypt::hash_with_result(&password, BCRYPT_COST)
            .map_err(|e| VbusError::Config(e.to_string()))?
            .format_for_version(bcrypt::Version::TwoA);

        Ok(Self {
            client: ClientConfig {
                user: format!("{id}.{hostname}"),
                password: hashed,
                permissions: Permissions {
                    subscribe: vec![id.to_owned(), format!("{id}.>")],
                    publish: vec![id.to_owned(), format!("{id}.>")],
                },
            },
            key: KeyConfig { private: password },
            vbus: VbusLocation::default(),
        })
    }

    /// Rewrite `client.user`'s hostname segment (`<id>.<hostname>`) in place
    /// if it no longer matches the local hostname.
    pub fn reconcile_hostname(&mut self, id: &str, hostname: &str) {
        let expected = format!("{id}.{hostname}");
        if self.client.user != expected {
            self.client.user = expected;
        }
    }

    fn path_for(root: &Path, id: &str) -> PathBuf {
        root.join(format!("{id}.conf"))
    }

    /// Load `<root>/<id>.conf`, creating and persisting a fresh default
    /// config when absent or structurally invalid.
    ///
    /// When `creds_file` is set the module authenticates with an external
    /// NATS credentials file rather than a locally-issued identity, so the
    /// on-disk shape is the "v2" `{"vbus": {...}}` document (no client/key
    /// block expected or required).
    pub fn load_or_create(root: &Path, id: &str, hostname: &str, creds_file: Option<&str>) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| VbusError::Config(e.to_string()))?;
        let path = Self::path_for(root, id);

        if creds_file.is_some() {
            if path.is_file() {
                let content = std::fs::read_to_string(&path).map_err(|e| VbusError::Config(e.to_string()))?;
                match serde_json::from_str::<VbusOnlyConfig>(&content) {
                    Ok(v2) => return Ok(Self::from_vbus_only(v2)),
                    Err(_) => {
                        tracing::warn!(id, "invalid v2 configuration detected, resetting to default");
                    }
                }
            }

            let config = Self::from_vbus_only(VbusOnlyConfig::default());
            config.save(root, id)?;
            return Ok(config);
        }

        if path.is_file() {
            let content = std::fs::read_to_string(&path).map_err(|e| VbusError::Config(e.to_string()))?;
            match serde_json::from_str::<Self>(&content) {
                Ok(mut config) if config.validate() => {
                    config.reconcile_hostname(id, hostname);
                    return Ok(config);
                }
                _ => {
                    tracing::warn!(id, "invalid configuration detected, resetting to default");
                }
            }
        }

        let config = Self::generate(id, hostname)?;
        config.save(root, id)?;
        Ok(config)
    }

    /// Atomically persist this config to `<root>/<id>.conf` via a
    /// write-then-rename.
    pub fn save(&self, root: &Path, id: &str) -> Result<()> {
        std::fs::create_dir_all(root).map_err(|e| VbusError::Config(e.to_string()))?;
        let path = Self::path_for(root, id);
        let tmp = path.with_extension("tmp");
        let body = serde_json::to_string_pretty(self).map_err(|e| VbusError::Config(e.to_string()))?;
        std::fs::write(&tmp, body).map_err(|e| VbusError::Config(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| VbusError::Config(e.to_string()))?;
        Ok(())
    }
}

/// Generate a 22-character `[A-Za-z0-9]` password for a new enrollment.
pub fn generate_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..PASSWORD_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
