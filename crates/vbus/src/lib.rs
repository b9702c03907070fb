// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vBus: a distributed object model layered on a publish/subscribe bus
//! (NATS). Modules expose a tree of elements — nodes, attributes, methods —
//! that remote processes discover, read, mutate, and subscribe to through
//! transparent proxies.

pub mod bus;
pub mod codec;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod element;
pub mod error;
pub mod info;
pub mod mdns;
pub mod module;
pub mod path;
pub mod permission;
pub mod proxy;
pub mod schema;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tree;

pub use element::Element;
pub use error::{Result, VbusError};
pub use module::Module;
