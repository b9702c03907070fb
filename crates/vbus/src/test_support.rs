// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only helper that spawns a real `nats-server` subprocess, skipping
//! (not failing) tests when it isn't on `$PATH`.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// A `nats-server` subprocess bound to a free localhost port. Killed on
/// drop.
pub struct NatsServer {
    child: Child,
    port: u16,
}

impl NatsServer {
    /// Spawn `nats-server -p <free-port>`. Returns `None` (do not fail the
    /// test) if the binary isn't available or fails to come up.
    pub async fn start() -> Option<Self> {
        let port = free_port()?;

        let child = Command::new("nats-server")
            .args(["-p", &port.to_string(), "-a", "127.0.0.1"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .ok()?;

        let server = Self { child, port };
        if server.wait_ready().await {
            Some(server)
        } else {
            None
        }
    }

    pub fn url(&self) -> String {
        format!("nats://127.0.0.1:{}", self.port)
    }

    async fn wait_ready(&self) -> bool {
        for _ in 0..50 {
            if async_nats::connect(self.url()).await.is_ok() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        false
    }
}

impl Drop for NatsServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> Option<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").ok()?;
    listener.local_addr().ok().map(|a| a.port())
}

/// Skip (print and return `Ok(())`) the enclosing test instead of failing it
/// when no `nats-server` subprocess could be spawned. Assumes the enclosing
/// test function returns `anyhow::Result<()>`, matching this crate's
/// test-writing convention.
#[macro_export]
macro_rules! require_nats {
    () => {
        match $crate::test_support::NatsServer::start().await {
            Some(server) => server,
            None => {
                eprintln!("skipping: nats-server not available on PATH");
                return Ok(());
            }
        }
    };
}
