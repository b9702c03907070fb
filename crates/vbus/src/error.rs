// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Error taxonomy shared across the dispatcher, proxies, and bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum VbusError {
    #[error("path not found")]
    NotFound,

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("value does not validate against schema: {0}")]
    Validation(String),

    #[error("request timed out")]
    Timeout,

    #[error("cannot find a valid vbus url")]
    Connection,

    #[error("permission request was not acknowledged")]
    PermissionDenied,

    #[error("bus error: {0}")]
    Bus(String),

    #[error("config error: {0}")]
    Config(String),
}

impl VbusError {
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Internal(_) => 500,
            Self::Validation(_) => 400,
            Self::Timeout => 408,
            Self::Connection => 503,
            Self::PermissionDenied => 403,
            Self::Bus(_) => 502,
            Self::Config(_) => 500,
        }
    }

    /// Render as the wire-level `Error` element representation (spec §3, §7).
    pub fn to_wire(&self) -> ErrorBody {
        match self {
            Self::NotFound => ErrorBody { code: 404, message: "not found".to_owned(), detail: None },
            Self::Internal(detail) => ErrorBody {
                code: 500,
                message: "internal server error".to_owned(),
                detail: Some(detail.clone()),
            },
            other => ErrorBody { code: other.code(), message: other.to_string(), detail: None },
        }
    }
}

impl From<async_nats::PublishError> for VbusError {
    fn from(e: async_nats::PublishError) -> Self {
        Self::Bus(e.to_string())
    }
}

impl From<async_nats::RequestError> for VbusError {
    fn from(e: async_nats::RequestError) -> Self {
        use async_nats::RequestErrorKind;
        match e.kind() {
            RequestErrorKind::TimedOut => Self::Timeout,
            _ => Self::Bus(e.to_string()),
        }
    }
}

impl From<async_nats::SubscribeError> for VbusError {
    fn from(e: async_nats::SubscribeError) -> Self {
        Self::Bus(e.to_string())
    }
}

/// Wire-level error reply: `{code, message, detail?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub type Result<T> = std::result::Result<T, VbusError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
