// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus client wrapper: connection bootstrap, enrollment, and prefixed
//! publish/request/subscribe.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_nats::{Client, ConnectOptions};
use regex::Regex;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::codec;
use crate::config::ModuleConfig;
use crate::error::{Result, VbusError};
use crate::path;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const VBUS_PORT: &str = "21400";
/// Port used when connecting with an external NATS credentials file rather
/// than a locally-issued identity.
const VBUS_CREDS_PORT: &str = "8421";

/// Handler invoked for each message on a subscription: decoded payload plus
/// the wildcard capture groups from the subject, if any. A `Some` return is
/// encoded and published back to the message's reply subject.
pub type SubscribeHandler =
    Arc<dyn Fn(Value, Vec<String>) -> crate::element::BoxFuture<Option<Value>> + Send + Sync>;

/// Owns the bus connection and the module's identity (`id = domain.app`,
/// local hostname).
pub struct BusClient {
    client: Client,
    id: String,
    hostname: String,
    remote_hostname: Mutex<Option<String>>,
}

impl BusClient {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub async fn remote_hostname(&self) -> Option<String> {
        self.remote_hostname.lock().await.clone()
    }

    fn full_subject(&self, path: &str, with_id: bool, with_host: bool) -> String {
        let id = if with_id { self.id.as_str() } else { "" };
        let host = if with_host { self.hostname.as_str() } else { "" };
        path::join([id, host, path])
    }

    /// A fresh unique inbox subject, used by [`crate::discovery`] as an
    /// open-ended reply subject for scatter-gather requests.
    pub fn new_inbox(&self) -> String {
        self.client.new_inbox()
    }

    /// Subscribe to a literal subject with no id/host prefixing, returning
    /// the raw subscriber stream for callers that need to read replies
    /// themselves rather than going through [`Self::subscribe`]'s dispatch.
    pub async fn subscribe_raw(&self, subject: &str) -> Result<async_nats::Subscriber> {
        self.client.subscribe(subject.to_owned()).await.map_err(VbusError::from)
    }

    pub async fn unsubscribe_raw(&self, subscriber: &mut async_nats::Subscriber) -> Result<()> {
        subscriber.unsubscribe().await.map_err(|e| VbusError::Bus(e.to_string()))
    }

    /// Publish to a literal subject with an explicit reply-to, with no
    /// id/host prefixing.
    pub async fn publish_with_reply<T: serde::Serialize>(&self, subject: &str, reply: &str, payload: &T) -> Result<()> {
        let bytes = codec::to_vbus(payload)?;
        self.client
            .publish_with_reply(subject.to_owned(), reply.to_owned(), bytes.into())
            .await
            .map_err(|e| VbusError::Bus(e.to_string()))
    }

    /// Publish `payload` (any serializable value) to `path`.
    pub async fn publish<T: serde::Serialize>(
        &self,
        path: &str,
        payload: &T,
        with_id: bool,
        with_host: bool,
    ) -> Result<()> {
        let subject = self.full_subject(path, with_id, with_host);
        let bytes = codec::to_vbus(payload)?;
        self.client.publish(subject.clone(), bytes.into()).await.map_err(|e| {
            tracing::warn!(subject, "publish failed: {e}");
            VbusError::Bus(e.to_string())
        })
    }

    /// Request/reply on `path`, decoding the reply payload as JSON.
    pub async fn request<T: serde::Serialize>(
        &self,
        path: &str,
        payload: &T,
        timeout: Duration,
        with_id: bool,
        with_host: bool,
    ) -> Result<Value> {
        let subject = self.full_subject(path, with_id, with_host);
        let bytes = codec::to_vbus(payload)?;
        let fut = self.client.request(subject, bytes.into());
        let message = tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| VbusError::Timeout)?
            .map_err(VbusError::from)?;
        codec::from_vbus(&message.payload)
    }

    /// Subscribe on `path`, dispatching each message to `handler` on its own
    /// task so a slow handler never blocks subsequent deliveries.
    ///
    /// `path` may contain `*`/`>` wildcards; captured segments are passed to
    /// `handler` in order after the decoded payload.
    pub async fn subscribe(
        &self,
        path: &str,
        with_id: bool,
        with_host: bool,
        handler: SubscribeHandler,
    ) -> Result<tokio::task::JoinHandle<()>> {
        let subject = self.full_subject(path, with_id, with_host);
        let regex = Regex::new(&path::wildcard_regex(&subject))
            .map_err(|e| VbusError::Internal(e.to_string()))?;
        let mut subscriber = self.client.subscribe(subject.clone()).await.map_err(VbusError::from)?;
        let client = self.client.clone();

        let join = tokio::spawn(async move {
            use futures_util::StreamExt;
            while let Some(message) = subscriber.next().await {
                let handler = handler.clone();
                let client = client.clone();
                let regex = regex.clone();
                let reply = message.reply.clone();
                tokio::spawn(async move {
                    let captures: Vec<String> = regex
                        .captures(message.subject.as_str())
                        .map(|c| {
                            c.iter()
                                .skip(1)
                                .filter_map(|m| m.map(|m| m.as_str().to_owned()))
                                .collect()
                        })
                        .unwrap_or_default();

                    let payload = match codec::from_vbus(&message.payload) {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!(subject = %message.subject, "bad payload: {e}");
                            return;
                        }
                    };

                    let result = handler(payload, captures).await;

                    if let (Some(reply_subject), Some(value)) = (reply, result) {
                        match codec::to_vbus(&value) {
                            Ok(bytes) => {
                                if let Err(e) = client.publish(reply_subject, bytes.into()).await {
                                    tracing::warn!("reply publish failed: {e}");
                                }
                            }
                            Err(e) => tracing::warn!("failed to encode reply: {e}"),
                        }
                    }
                });
            }
        });

        Ok(join)
    }

    /// Connect and, unless `creds_file` external credentials are in play,
    /// perform enrollment: authenticate with the module's stored
    /// credentials, falling back to an anonymous enrollment handshake when
    /// that fails.
    ///
    /// When `creds_file` is `Some`, the module authenticates with that NATS
    /// credentials file instead, on the credentials port rather than the
    /// locally-issued one; enrollment never runs in that case, since there
    /// is no locally-issued identity to enroll.
    pub async fn connect(
        id: &str,
        hostname: &str,
        hub_id: Option<&str>,
        creds_file: Option<&str>,
        config: &mut ModuleConfig,
    ) -> Result<Self> {
        let hostname = path::sanitize_segment(hostname);
        let hostname = hostname.as_str();
        let port = if creds_file.is_some() { VBUS_CREDS_PORT } else { VBUS_PORT };
        let (url, discovered_host) = find_vbus_url(hub_id, config, port).await?;

        let client = match creds_file {
            Some(creds_path) => ConnectOptions::with_credentials_file(creds_path)
                .await
                .map_err(|e| VbusError::Config(e.to_string()))?
                .connect(&url)
                .await
                .map_err(|e| VbusError::Bus(e.to_string()))?,
            None => match ConnectOptions::with_user_and_password(config.client.user.clone(), config.key.private.clone())
                .connect(&url)
                .await
            {
                Ok(client) => client,
                Err(e) => {
                    tracing::debug!("authenticated connect failed ({e}), enrolling");
                    enroll(&url, hostname, config).await?;
                    ConnectOptions::with_user_and_password(config.client.user.clone(), config.key.private.clone())
                        .connect(&url)
                        .await
                        .map_err(|e| VbusError::Bus(e.to_string()))?
                }
            },
        };

        let remote_hostname = discovered_host.or_else(|| config.vbus.hostname.clone());

        config.vbus.url = Some(url);
        config.vbus.hostname = remote_hostname.clone();

        Ok(Self {
            client,
            id: id.to_owned(),
            hostname: hostname.to_owned(),
            remote_hostname: Mutex::new(remote_hostname),
        })
    }
}

/// Try each candidate URL anonymously, bounded to [`CONNECT_TIMEOUT`];
/// the first to connect wins (spec §4.1).
async fn test_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    let fut = ConnectOptions::with_user_and_password("anonymous".to_owned(), "anonymous".to_owned()).connect(url);
    matches!(tokio::time::timeout(CONNECT_TIMEOUT, fut).await, Ok(Ok(_)))
}

/// Query `system.info` for the authoritative remote hostname once connected.
async fn hostname_from_vbus(url: &str, local_ip: IpAddr) -> Option<String> {
    let client = ConnectOptions::with_user_and_password("anonymous".to_owned(), "anonymous".to_owned())
        .connect(url)
        .await
        .ok()?;
    let payload = local_ip.to_string().into_bytes();
    let message = tokio::time::timeout(Duration::from_secs(10), client.request("system.info", payload.into()))
        .await
        .ok()?
        .ok()?;
    let info: Value = serde_json::from_slice(&message.payload).ok()?;
    info.get("hostname").and_then(|v| v.as_str()).map(str::to_owned)
}

/// Resolve an explicit hub id as a literal IP, else `<hub>.local` DNS
/// (strategy 1, spec §4.1).
fn hub_id_url(hub_id: &str, port: &str) -> Vec<String> {
    let ip: Option<IpAddr> = hub_id.parse().ok().or_else(|| {
        use std::net::ToSocketAddrs;
        (format!("{hub_id}.local"), 0u16).to_socket_addrs().ok()?.next().map(|a| a.ip())
    });
    ip.map(|ip| vec![format!("nats://{ip}:{port}")]).unwrap_or_default()
}

/// The six-strategy URL fallback chain (spec §4.1).
async fn find_vbus_url(hub_id: Option<&str>, config: &ModuleConfig, port: &str) -> Result<(String, Option<String>)> {
    let hostname = hostname::get().ok().and_then(|h| h.into_string().ok()).unwrap_or_default();

    let strategies: Vec<(&str, Vec<String>)> = vec![
        ("hub-id", hub_id.map(|h| hub_id_url(h, port)).unwrap_or_default()),
        ("config-file", config.vbus.url.clone().into_iter().collect()),
        ("env", std::env::var("VBUS_URL").into_iter().collect()),
        ("local-default", vec![format!("nats://{hostname}.service.veeamesh.local:{port}")]),
        ("zeroconf", crate::mdns::discover_vbus_urls().await),
        ("global-default", vec![format!("nats://vbus.service.veeamesh.local:{port}")]),
    ];

    for (name, urls) in strategies {
        for url in urls {
            if test_url(&url).await {
                tracing::debug!(strategy = name, url, "found valid vbus url");
                let local_ip = local_network_ip();
                let remote_host = match local_ip {
                    Some(ip) => hostname_from_vbus(&url, ip).await,
                    None => None,
                };
                return Ok((url, remote_host));
            }
            tracing::debug!(strategy = name, url, "url did not connect");
        }
    }

    Err(VbusError::Connection)
}

fn local_network_ip() -> Option<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|a| a.ip())
}

/// Anonymous enrollment: publish the module's auth block, wait briefly for
/// the controlling host to pick it up, then let the caller reconnect as the
/// real user (spec §4.1).
async fn enroll(url: &str, hostname: &str, config: &ModuleConfig) -> Result<()> {
    let remote_host = config.vbus.hostname.clone().unwrap_or_else(|| hostname.to_owned());
    let anon = ConnectOptions::with_user_and_password("anonymous".to_owned(), "anonymous".to_owned())
        .connect(url)
        .await
        .map_err(|e| VbusError::Bus(e.to_string()))?;

    let auth_subject = format!("system.authorization.{remote_host}.add");
    let bytes = serde_json::to_vec(&config.client).map_err(|e| VbusError::Internal(e.to_string()))?;
    anon.publish(auth_subject, bytes.into()).await.map_err(|e| VbusError::Bus(e.to_string()))?;
    anon.flush().await.map_err(|e| VbusError::Bus(e.to_string()))?;

    tokio::time::sleep(Duration::from_millis(250)).await;
    Ok(())
}

/// Re-assert the module's permission set with the controlling host,
/// retrying indefinitely with a 1-second backoff until acknowledged (spec
/// §4.1, used right after a successful enrollment/connect).
pub async fn assert_permissions(bus: &BusClient, config: &ModuleConfig) -> Result<()> {
    let remote_host = bus.remote_hostname().await.unwrap_or_else(|| bus.hostname.clone());
    let path = format!("system.authorization.{remote_host}.{}.{}.permissions.set", bus.id, bus.hostname);

    loop {
        let reply = bus.request(&path, &config.client.permissions, Duration::from_secs(10), false, false).await;
        match reply {
            Ok(value) if truthy(&value) => return Ok(()),
            _ => {
                tracing::debug!("permission assertion not yet acknowledged, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
