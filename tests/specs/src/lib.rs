// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end vBus scenarios.
//!
//! Spawns a real `nats-server` subprocess and attaches one or more
//! [`vbus::Module`]s to it, isolating each test's config directory and bus
//! URL through process-global env vars — tests that use [`TestBus`] must be
//! marked `#[serial_test::serial]`.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use vbus::test_support::NatsServer;

/// A `nats-server` subprocess plus an isolated `VBUS_PATH` config directory,
/// with both wired into the process environment for the lifetime of the
/// value. Restores neither on drop — callers hold this for a whole test and
/// the process exits after; env vars are process-global, so concurrent use
/// requires `#[serial_test::serial]`.
pub struct TestBus {
    server: NatsServer,
    _config_dir: tempfile::TempDir,
}

impl TestBus {
    pub async fn start() -> Option<Self> {
        let server = NatsServer::start().await?;
        let config_dir = tempfile::tempdir().ok()?;

        std::env::set_var("VBUS_URL", server.url());
        std::env::set_var("VBUS_PATH", config_dir.path());

        Some(Self { server, _config_dir: config_dir })
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Attach a new module named `<domain>.<app>` to this test bus.
    pub async fn module(&self, domain: &str, app: &str) -> anyhow::Result<vbus::Module> {
        Ok(vbus::Module::new(domain, app, None, None).await?)
    }
}

/// Skip (print and return `Ok(())`) the enclosing test instead of failing it
/// when no `nats-server` subprocess could be spawned.
#[macro_export]
macro_rules! require_bus {
    () => {
        match $crate::TestBus::start().await {
            Some(bus) => bus,
            None => {
                eprintln!("skipping: nats-server not available on PATH");
                return Ok(());
            }
        }
    };
}

/// Resolve the path to the compiled `vbus` binary, for the one test that
/// exercises `main.rs`'s own CLI/bootstrap wiring end-to-end rather than
/// calling into the library directly.
pub fn vbus_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("vbus")
}

/// A running `vbus` binary subprocess, killed on drop.
pub struct VbusProcess {
    child: Child,
    _config_dir: tempfile::TempDir,
}

impl VbusProcess {
    /// Spawn the `vbus` binary against `bus`, attached as `<domain>.<app>`.
    pub fn spawn(bus: &TestBus, domain: &str, app: &str) -> anyhow::Result<Self> {
        let binary = vbus_binary();
        anyhow::ensure!(binary.exists(), "vbus binary not found at {}", binary.display());
        let config_dir = tempfile::tempdir()?;

        let child = Command::new(&binary)
            .args(["--domain", domain, "--app", app])
            .env("VBUS_URL", bus.url())
            .env("VBUS_PATH", config_dir.path())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, _config_dir: config_dir })
    }
}

impl Drop for VbusProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
