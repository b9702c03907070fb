// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mDNS/zeroconf discovery of the bus server, used as connection bootstrap
//! strategy 5 (spec §4.1, §9). Browses `_nats._tcp.local.`, filters names
//! starting with `vBus`, reads `host`/`hostname`/`networkIp` TXT
//! properties. The fixed 5-second window is a design constant, not
//! configurable (spec §9).

use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceEvent};

const SERVICE_TYPE: &str = "_nats._tcp.local.";
const BROWSE_WINDOW: Duration = Duration::from_secs(5);
const VBUS_PORT: &str = "21400";

/// Browse for `_nats._tcp.local.` services advertised with a name starting
/// with `vBus`, returning candidate NATS URLs built from their advertised
/// `host`/`hostname`/address.
pub async fn discover_vbus_urls() -> Vec<String> {
    let daemon = match ServiceDaemon::new() {
        Ok(d) => d,
        Err(e) => {
            tracing::debug!("mdns daemon init failed: {e}");
            return Vec::new();
        }
    };

    let receiver = match daemon.browse(SERVICE_TYPE) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("mdns browse failed: {e}");
            return Vec::new();
        }
    };

    let mut urls = Vec::new();
    let deadline = tokio::time::Instant::now() + BROWSE_WINDOW;

    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, receiver.recv_async()).await {
        let Ok(event) = event else { break };
        if let ServiceEvent::ServiceResolved(info) = event {
            if !info.get_fullname().starts_with("vBus") {
                continue;
            }

            let host = info
                .get_properties()
                .get_property_val_str("host")
                .or_else(|| info.get_properties().get_property_val_str("hostname"))
                .map(str::to_owned)
                .unwrap_or_else(|| info.get_hostname().trim_end_matches('.').to_owned());

            if let Some(addr) = info.get_addresses().iter().next() {
                urls.push(format!("nats://{addr}:{VBUS_PORT}"));
            } else {
                urls.push(format!("nats://{host}:{VBUS_PORT}"));
            }
        }
    }

    let _ = daemon.shutdown();
    urls
}
