// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the vbus-gateway facade.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;
use crate::state::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub id: String,
    pub hostname: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    pub domain: String,
    pub app: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub level: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub path: String,
    pub tree: Value,
}

#[derive(Debug, Deserialize)]
pub struct ModulesQuery {
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ModulesResponse {
    pub modules: Vec<vbus::info::ModuleInfo>,
}

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        id: s.module.id().to_owned(),
        hostname: s.module.hostname().to_owned(),
    })
}

/// `GET /api/v1/discover?domain=...&app=...&timeout_ms=...&level=...`
///
/// Scatter-gathers every host exposing `<domain>.<app>` and returns the
/// merged tree as raw JSON (spec §4.5); the gateway itself never interprets
/// the shape, it only aggregates and serves it.
pub async fn discover(
    State(s): State<Arc<GatewayState>>,
    Query(q): Query<DiscoverQuery>,
) -> Result<impl IntoResponse, (axum::http::StatusCode, Json<crate::error::ErrorResponse>)> {
    let timeout = q.timeout_ms.map(Duration::from_millis).unwrap_or_else(|| s.config.default_timeout());

    let proxy = s
        .module
        .discover(&q.domain, &q.app, timeout, q.level)
        .await
        .map_err(|e| {
            let message = e.to_string();
            GatewayError::from(e).to_http_response(message)
        })?;

    let tree = match proxy {
        vbus::proxy::UnknownProxy::Node(n) => {
            Value::Object(n.items().into_iter().collect())
        }
        vbus::proxy::UnknownProxy::Attribute(a) => a.cached_value().cloned().unwrap_or(Value::Null),
        vbus::proxy::UnknownProxy::Method(_) => Value::Null,
    };

    Ok(Json(DiscoverResponse { path: format!("{}.{}", q.domain, q.app), tree }))
}

/// `GET /api/v1/modules?timeout_ms=...`
///
/// Scatter-gathers every module's `info` reply on the bus (spec §4.5).
pub async fn modules(
    State(s): State<Arc<GatewayState>>,
    Query(q): Query<ModulesQuery>,
) -> Result<impl IntoResponse, (axum::http::StatusCode, Json<crate::error::ErrorResponse>)> {
    let timeout = q.timeout_ms.map(Duration::from_millis).unwrap_or_else(|| s.config.default_timeout());

    let modules = s
        .module
        .discover_modules(timeout)
        .await
        .map_err(|e| {
            let message = e.to_string();
            GatewayError::from(e).to_http_response(message)
        })?;

    Ok(Json(ModulesResponse { modules }))
}
