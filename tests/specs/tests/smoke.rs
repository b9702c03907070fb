// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The six concrete scenarios and the discovery-merge / dispatcher-safety
//! invariants, run against a real `nats-server` subprocess (skipped, not
//! failed, when `nats-server` isn't on `$PATH`).

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use vbus::element::BoxFuture;
use vbus::proxy::UnknownProxy;
use vbus::schema::MethodSchema;
use vbus_specs::{require_bus, TestBus};

const TIMEOUT: Duration = Duration::from_secs(2);

/// Scenario 1: add then discover.
#[tokio::test]
#[serial_test::serial]
async fn add_then_discover() -> anyhow::Result<()> {
    let bus = require_bus!();
    let a = bus.module("system", "test").await?;

    a.add_node(&[], "dev", json!({"name": "X"}), None).await?;
    let scan = Arc::new(|_args: Vec<Value>| Box::pin(async { Ok(Value::Null) }) as BoxFuture<vbus::Result<Value>>);
    a.add_method(&["dev".to_owned()], "scan", scan, MethodSchema::new(&[], "null")).await?;

    let b = bus.module("system", "discoverer").await?;
    let proxy = b.discover("system", "test", TIMEOUT, None).await?;
    let node = match proxy {
        UnknownProxy::Node(node) => node,
        _ => anyhow::bail!("expected a node-shaped merged tree"),
    };

    let tree = node.tree();
    let host = a.hostname();
    assert_eq!(tree[host]["dev"]["name"]["value"], json!("X"));
    assert_eq!(tree[host]["dev"]["scan"]["returns"]["schema"]["type"], json!("null"));

    Ok(())
}

/// Scenario 2: remote method call.
#[tokio::test]
#[serial_test::serial]
async fn remote_method_call() -> anyhow::Result<()> {
    let bus = require_bus!();
    let a = bus.module("system", "test").await?;

    let received: Arc<Mutex<Option<i64>>> = Arc::new(Mutex::new(None));
    let received_clone = received.clone();
    let scan = Arc::new(move |args: Vec<Value>| {
        let received = received_clone.clone();
        Box::pin(async move {
            let time = args.first().and_then(Value::as_i64);
            *received.lock().await = time;
            Ok(Value::Null)
        }) as BoxFuture<vbus::Result<Value>>
    });
    a.add_method(&[], "scan", scan, MethodSchema::new(&[], "null")).await?;

    let b = bus.module("system", "caller").await?;
    let proxy = b.discover("system", "test", TIMEOUT, None).await?;
    let node = match proxy {
        UnknownProxy::Node(node) => node,
        _ => anyhow::bail!("expected a node-shaped merged tree"),
    };
    let host = a.hostname().to_owned();
    let method = node.get_method(&[&host, "scan"], TIMEOUT).await?;
    let reply = method.call(vec![json!(60)], TIMEOUT).await?;

    assert_eq!(reply, Value::Null);
    assert_eq!(*received.lock().await, Some(60));

    Ok(())
}

/// Scenario 3: remote attribute get_value.
#[tokio::test]
#[serial_test::serial]
async fn remote_attribute_get_value() -> anyhow::Result<()> {
    let bus = require_bus!();
    let a = bus.module("system", "test").await?;

    let on_get = Arc::new(|| Box::pin(async { json!(21) }) as BoxFuture<Value>);
    a.add_attribute(&[], "temp", None, None, Some(on_get)).await?;

    let b = bus.module("system", "reader").await?;
    let proxy = b.discover("system", "test", TIMEOUT, None).await?;
    let node = match proxy {
        UnknownProxy::Node(node) => node,
        _ => anyhow::bail!("expected a node-shaped merged tree"),
    };
    let host = a.hostname().to_owned();
    let attr = node.get_attribute(&[&host, "temp"], TIMEOUT).await?;

    assert_eq!(attr.get_value(false, TIMEOUT).await?, json!(21));
    assert_eq!(attr.get_value(true, TIMEOUT).await?, Value::Null);

    Ok(())
}

/// A remote `set` must validate against the attribute's schema and persist
/// through the cached value before `on_set` runs as a side effect; a
/// schema-rejected set must leave the cached value untouched.
#[tokio::test]
#[serial_test::serial]
async fn remote_attribute_set_validates_and_persists() -> anyhow::Result<()> {
    let bus = require_bus!();
    let a = bus.module("system", "test").await?;

    let on_set_calls: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let on_set_calls_clone = on_set_calls.clone();
    let on_set = Arc::new(move |value: Value, _parts: Vec<String>| {
        let on_set_calls = on_set_calls_clone.clone();
        Box::pin(async move {
            on_set_calls.lock().await.push(value);
            Ok(Value::Null)
        }) as BoxFuture<vbus::Result<Value>>
    });
    a.add_attribute(&[], "temp", Some(json!(20)), Some(on_set), None).await?;

    let b = bus.module("system", "writer").await?;
    let proxy = b.discover("system", "test", TIMEOUT, None).await?;
    let node = match proxy {
        UnknownProxy::Node(node) => node,
        _ => anyhow::bail!("expected a node-shaped merged tree"),
    };
    let host = a.hostname().to_owned();
    let attr = node.get_attribute(&[&host, "temp"], TIMEOUT).await?;

    attr.set(json!(42)).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(attr.get_value(true, TIMEOUT).await?, json!(42));
    assert_eq!(*on_set_calls.lock().await, vec![json!(42)]);

    attr.set(json!("not-an-integer")).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(attr.get_value(true, TIMEOUT).await?, json!(42), "schema-rejected set must not persist");
    assert_eq!(*on_set_calls.lock().await, vec![json!(42)], "schema-rejected set must not invoke on_set");

    Ok(())
}

/// A uuid containing `.` must not be allowed to introduce a spurious path
/// boundary: it lands as a single sanitized segment, not a nested child.
#[tokio::test]
#[serial_test::serial]
async fn dotted_uuid_is_sanitized_to_a_single_segment() -> anyhow::Result<()> {
    let bus = require_bus!();
    let a = bus.module("system", "test").await?;
    a.add_node(&[], "a.b", Value::Object(Default::default()), None).await?;

    let b = bus.module("system", "reader").await?;
    let proxy = b.discover("system", "test", TIMEOUT, None).await?;
    let node = match proxy {
        UnknownProxy::Node(node) => node,
        _ => anyhow::bail!("expected a node-shaped merged tree"),
    };

    let tree = node.tree();
    let host = a.hostname();
    assert!(tree[host]["a_b"].is_object(), "dotted uuid should sanitize to a_b, got: {:?}", tree[host]);
    assert!(tree[host].get("a").is_none(), "dotted uuid must not split into nested node 'a'");

    Ok(())
}

/// Scenario 4: permission negotiation, answered by a fake authorization
/// responder standing in for the controlling host.
#[tokio::test]
#[serial_test::serial]
async fn permission_negotiation() -> anyhow::Result<()> {
    let bus = require_bus!();
    let mut b = bus.module("system", "asker").await?;

    let responder = async_nats::connect(bus.url()).await?;
    let subject =
        format!("system.authorization.{host}.{id}.{host}.permissions.set", host = b.hostname(), id = b.id());
    let mut subscriber = responder.subscribe(subject).await?;
    let request_count = Arc::new(Mutex::new(0u32));
    let request_count_clone = request_count.clone();
    let responder_task = tokio::spawn(async move {
        while let Some(message) = subscriber.next().await {
            *request_count_clone.lock().await += 1;
            if let Some(reply) = message.reply {
                let _ = responder.publish(reply, b"true".as_slice().into()).await;
            }
        }
    });

    let first = b.ask_permission("system.test.>").await?;
    let second = b.ask_permission("system.test.>").await?;
    responder_task.abort();

    assert!(first);
    assert!(second);
    assert_eq!(*request_count.lock().await, 1, "idempotent ask_permission issues exactly one bus request");

    Ok(())
}

/// Scenario 5: not-found.
#[tokio::test]
#[serial_test::serial]
async fn not_found() -> anyhow::Result<()> {
    let bus = require_bus!();
    let a = bus.module("system", "test").await?;
    a.add_node(&[], "dev", Value::Object(Default::default()), None).await?;

    let b = bus.module("system", "reader").await?;
    let proxy = b.discover("system", "test", TIMEOUT, None).await?;
    let node = match proxy {
        UnknownProxy::Node(node) => node,
        _ => anyhow::bail!("expected a node-shaped merged tree"),
    };
    let host = a.hostname().to_owned();
    let missing = node.get_node(&[&host, "absent"], TIMEOUT).await?;

    assert_eq!(missing.tree()["code"], json!(404));
    assert_eq!(missing.tree()["message"], json!("not found"));

    Ok(())
}

/// Scenario 6: subscribe add.
#[tokio::test]
#[serial_test::serial]
async fn subscribe_add_fires_once() -> anyhow::Result<()> {
    let bus = require_bus!();
    let a = bus.module("system", "test").await?;

    let b = bus.module("system", "watcher").await?;
    let proxy = b.discover("system", "test", TIMEOUT, None).await?;
    let node = match proxy {
        UnknownProxy::Node(node) => node,
        _ => anyhow::bail!("expected a node-shaped merged tree"),
    };
    let host = a.hostname().to_owned();
    let root = node.get_node(&[&host], TIMEOUT).await?;

    let fired: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let fired_clone = fired.clone();
    let _handle = root
        .subscribe_add(&[], move |child| {
            let fired = fired_clone.clone();
            let path = child.path().to_owned();
            tokio::spawn(async move { fired.lock().await.push(path) });
        })
        .await?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    a.add_node(&[], "new", Value::Object(Default::default()), None).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let seen = fired.lock().await;
    assert_eq!(seen.len(), 1);
    assert!(seen[0].ends_with("new"));

    Ok(())
}

/// Exercises the compiled `vbus` binary's own CLI/bootstrap wiring, not just
/// the library: skips (rather than fails) if the binary hasn't been built.
#[tokio::test]
#[serial_test::serial]
async fn compiled_binary_attaches_and_is_discoverable() -> anyhow::Result<()> {
    let bus = require_bus!();
    let binary = vbus_specs::vbus_binary();
    if !binary.exists() {
        eprintln!("skipping: vbus binary not built at {}", binary.display());
        return Ok(());
    }
    let _process = vbus_specs::VbusProcess::spawn(&bus, "system", "cli-demo")?;

    let reader = bus.module("system", "reader").await?;
    let mut attempts = 0;
    loop {
        match reader.discover("system", "cli-demo", Duration::from_millis(300), None).await {
            Ok(UnknownProxy::Node(_)) => break,
            _ if attempts < 10 => {
                attempts += 1;
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Err(e) => return Err(e.into()),
            _ => anyhow::bail!("compiled vbus binary never became discoverable"),
        }
    }

    Ok(())
}
