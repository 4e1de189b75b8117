//! Bridges from the log and tracing ecosystems

#![cfg(any(feature = "log-compat", feature = "tracing-compat"))]

use serde_json::Value as Json;
use std::sync::Arc;
use strata_log::{Config, Level, Registry};
use strata_logger::MemorySink;

fn json_registry() -> (Arc<Registry>, Arc<MemorySink>, Arc<MemorySink>) {
    let info = Arc::new(MemorySink::new());
    let error = Arc::new(MemorySink::new());
    let mut config = Config::default()
        .with_console_info_stream(info.clone())
        .with_console_error_stream(error.clone());
    config.encode_as_json = true;

    let registry = Arc::new(Registry::new());
    registry.configure(config).unwrap();
    info.clear();
    error.clear();
    (registry, info, error)
}

fn records(sink: &MemorySink) -> Vec<Json> {
    sink.lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[cfg(feature = "log-compat")]
#[test]
fn test_log_bridge() {
    let (registry, info, error) = json_registry();
    strata_log::compat::init_log_bridge(registry.clone()).unwrap();

    log::info!(target: "db", attempt = 3, table = "users"; "connected");
    log::warn!("pool {} of {}", 1, 4);
    log::trace!("trace maps to debug");

    let lines = records(&info);
    assert_eq!(lines[0]["msg"], "connected");
    assert_eq!(lines[0]["target"], "db");
    assert_eq!(lines[0]["attempt"], 3);
    assert_eq!(lines[0]["table"], "users");
    assert!(lines[0]["caller"].as_str().unwrap().starts_with("tests/compat.rs:"));
    assert_eq!(lines[1]["lvl"], "debug");
    assert_eq!(records(&error)[0]["msg"], "pool 1 of 4");

    info.clear();
    registry.set_level(Level::Warn);
    log::info!("filtered by the registry level");
    assert!(info.is_empty());
}

#[cfg(feature = "tracing-compat")]
#[test]
fn test_tracing_bridge() {
    use tracing_subscriber::prelude::*;

    let (registry, info, error) = json_registry();
    let subscriber = tracing_subscriber::registry()
        .with(strata_log::compat::TracingBridge::new(registry.clone()));

    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("request");
        let _guard = span.enter();
        tracing::info!(user = "ada", ok = true, "handled");
        tracing::error!(code = 503_u64, "upstream failed");
    });

    let handled = &records(&info)[0];
    assert_eq!(handled["msg"], "handled");
    assert_eq!(handled["user"], "ada");
    assert_eq!(handled["ok"], true);
    assert_eq!(handled["span"], "request");

    let failed = &records(&error)[0];
    assert_eq!(failed["lvl"], "error");
    assert_eq!(failed["code"], 503);
}
