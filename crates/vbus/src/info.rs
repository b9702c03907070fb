// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module self-description, answered on the `info` subject (spec §4.3, §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleStatus {
    #[serde(rename = "heapSize")]
    pub heap_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub id: String,
    pub hostname: String,
    pub client: String,
    #[serde(rename = "hasStaticFiles")]
    pub has_static_files: bool,
    pub status: ModuleStatus,
}

impl ModuleInfo {
    pub fn current(id: &str, hostname: &str, client_user: &str, has_static_files: bool) -> Self {
        Self {
            id: id.to_owned(),
            hostname: hostname.to_owned(),
            client: client_user.to_owned(),
            has_static_files,
            status: ModuleStatus { heap_size: current_heap_size() },
        }
    }
}

/// Resident memory size in bytes, read from `/proc/self/statm` on Linux.
/// Elsewhere, or on read failure, `0`.
fn current_heap_size() -> u64 {
    read_statm_resident_bytes().unwrap_or(0)
}

#[cfg(target_os = "linux")]
fn read_statm_resident_bytes() -> Option<u64> {
    let content = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = content.split_whitespace().nth(1)?.parse().ok()?;
    let page_size = 4096u64;
    Some(resident_pages * page_size)
}

#[cfg(not(target_os = "linux"))]
fn read_statm_resident_bytes() -> Option<u64> {
    None
}
