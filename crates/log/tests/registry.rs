//! Registry configuration and default-logger behaviour

use pretty_assertions::assert_eq;
use serde_json::Value as Json;
use std::fs;
use std::sync::Arc;
use strata_log::*;
use strata_logger::MemorySink;
use tempfile::TempDir;

struct Console {
    info: Arc<MemorySink>,
    error: Arc<MemorySink>,
}

impl Console {
    fn new() -> Self {
        Self {
            info: Arc::new(MemorySink::new()),
            error: Arc::new(MemorySink::new()),
        }
    }

    fn attach(&self, config: Config) -> Config {
        config
            .with_console_info_stream(self.info.clone())
            .with_console_error_stream(self.error.clone())
    }

    fn json(&self) -> Config {
        let mut config = self.attach(Config::default());
        config.encode_as_json = true;
        config
    }

    fn clear(&self) {
        self.info.clear();
        self.error.clear();
    }
}

fn records(sink: &MemorySink) -> Vec<Json> {
    sink.lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_banner_on_both_channels() {
    let console = Console::new();
    let registry = Registry::new();

    registry.configure(console.json()).unwrap();

    for sink in [&console.info, &console.error] {
        let banner = &records(sink)[0];
        assert_eq!(banner["msg"], CONFIGURED_MESSAGE);
        assert_eq!(banner["fileLogging"], false);
        assert_eq!(banner["consoleLogging"], true);
        assert_eq!(banner["caller"], true);
        assert_eq!(banner["callerSkip"], 1);
        assert_eq!(banner["jsonLogOutput"], true);
        assert_eq!(banner["logDirectory"], "");
        assert_eq!(banner["maxSizeMB"], 0);
        assert_eq!(banner["maxBackups"], 0);
        assert_eq!(banner["maxAgeInDays"], 0);
        assert!(banner["caller"].is_boolean());
    }
    assert_eq!(records(&console.info)[0]["lvl"], "info");
    assert_eq!(records(&console.error)[0]["lvl"], "error");
}

#[test]
fn test_console_forced_on_without_files() {
    let console = Console::new();
    let registry = Registry::new();
    let mut config = console.json();
    config.console_logging_enabled = false;
    config.caller_enabled = false;

    registry.configure(config).unwrap();
    console.clear();
    registry.logger().info("still visible");

    let record = &records(&console.info)[0];
    assert_eq!(record["msg"], "still visible");
    assert!(record.get("caller").is_none());
}

#[test]
fn test_text_output() {
    let console = Console::new();
    let registry = Registry::new();
    let mut config = console.attach(Config::default());
    config.caller_enabled = false;

    registry.configure(config).unwrap();
    console.clear();
    registry.logger().warnv("slow", [field("ms", 250)]);

    let line = &console.error.lines()[0];
    assert!(line.ends_with("|warn|slow|ms=250"), "{line}");
}

#[test]
fn test_file_channels() {
    let dir = TempDir::new().unwrap();
    let console = Console::new();
    let registry = Registry::new();
    let mut config = console.json();
    config.file_logging_enabled = true;
    config.directory = dir.path().join("logs");
    config.filename = "svc.log".to_string();

    registry.configure(config).unwrap();
    let logger = registry.logger();
    logger.info("hello");
    logger.error("bad");
    logger.sync().unwrap();

    let info = fs::read_to_string(dir.path().join("logs/svc_info.log")).unwrap();
    let error = fs::read_to_string(dir.path().join("logs/svc_error.log")).unwrap();
    assert!(info.contains(CONFIGURED_MESSAGE));
    assert!(info.contains("\"msg\":\"hello\""));
    assert!(!info.contains("bad"));
    assert!(error.contains("\"msg\":\"bad\""));
    assert!(!error.contains("hello"));
    assert!(console.info.is_empty());
    assert!(console.error.is_empty());
}

#[test]
fn test_reconfigure_shares_rotating_files() {
    let dir = TempDir::new().unwrap();
    let console = Console::new();
    let registry = Registry::new();
    let file_config = || {
        let mut config = console.json();
        config.file_logging_enabled = true;
        config.console_logging_enabled = false;
        config.directory = dir.path().to_path_buf();
        config.filename = "svc".to_string();
        config.max_size_mb = 1;
        config
    };

    registry.configure(file_config()).unwrap();
    let old = registry.logger();
    registry.configure(file_config()).unwrap();
    let new = registry.logger();

    let payload = "x".repeat(1000);
    for i in 0..2500 {
        let logger = if i % 2 == 0 { &old } else { &new };
        let fields = Fields::from([
            ("seq", Value::from(i)),
            ("payload", Value::from(payload.clone())),
        ]);
        logger.info_with("bulk", fields);
    }
    old.sync().unwrap();

    let mut files = 0;
    let mut bulk = 0;
    for entry in fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if !name.starts_with("svc_info") {
            continue;
        }
        files += 1;
        assert!(fs::metadata(&path).unwrap().len() <= 1024 * 1024, "{name} too large");
        bulk += fs::read_to_string(&path)
            .unwrap()
            .lines()
            .filter(|line| line.contains("\"msg\":\"bulk\""))
            .count();
    }
    assert!(files >= 3);
    assert_eq!(bulk, 2500);
}

#[test]
fn test_file_failure_keeps_working_logger() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();

    let console = Console::new();
    let registry = Registry::new();
    let mut config = console.json();
    config.file_logging_enabled = true;
    config.directory = blocker.join("logs");

    let err = registry.configure(config).unwrap_err();
    assert!(matches!(
        err,
        Error::File(strata_logger_file::Error::CreateDirectory { .. })
    ));

    let failures: Vec<_> = records(&console.error)
        .into_iter()
        .filter(|r| r["msg"] == FILE_FAILURE_MESSAGE)
        .collect();
    assert_eq!(failures.len(), 2);
    assert!(failures[0]["path"].as_str().unwrap().ends_with("logs"));
    assert!(failures[0]["error"].is_string());

    let banner = &records(&console.info)[0];
    assert_eq!(banner["consoleLogging"], true);

    console.clear();
    registry.logger().info("degraded but alive");
    assert_eq!(records(&console.info)[0]["msg"], "degraded but alive");
}

#[test]
fn test_set_level_reaches_existing_handles() {
    let console = Console::new();
    let registry = Registry::new();
    registry.configure(console.json()).unwrap();
    let held = registry.logger();
    console.clear();

    registry.set_level(Level::Warn);
    held.info("dropped");
    registry.logger().info("dropped");
    held.warn("kept");

    assert_eq!(registry.level(), Level::Warn);
    assert!(console.info.is_empty());
    assert_eq!(records(&console.error).len(), 1);
    assert_eq!(registry.gate().get(), Level::Warn);
}

#[test]
fn test_reconfigure_swaps_default_only() {
    let first = Console::new();
    let second = Console::new();
    let registry = Registry::new();
    registry.configure(first.json()).unwrap();
    let old = registry.logger();

    registry.configure(second.json()).unwrap();
    first.clear();
    second.clear();
    old.info("old");
    registry.logger().info("new");

    assert_eq!(records(&first.info)[0]["msg"], "old");
    assert_eq!(records(&second.info)[0]["msg"], "new");
    assert_eq!(first.info.lines().len(), 1);
}

#[test]
fn test_new_logger_leaves_default_alone() {
    let default = Console::new();
    let standalone = Console::new();
    let registry = Registry::new();
    registry.configure(default.json()).unwrap();

    let logger = registry.new_logger(standalone.json()).unwrap();
    assert_eq!(records(&standalone.info)[0]["msg"], CONFIGURED_MESSAGE);
    default.clear();
    standalone.clear();

    registry.set_level(Level::Error);
    logger.info("independent gate");
    registry.logger().info("gated");

    assert_eq!(records(&standalone.info)[0]["msg"], "independent gate");
    assert!(default.info.is_empty());
}

#[test]
fn test_process_scope_fields() {
    let console = Console::new();
    let registry = Registry::new();
    registry.configure(console.json()).unwrap();
    console.clear();

    registry.with_field("user", "ada").info("a");
    registry.with("bare").info("b");
    registry
        .with_fields(Fields::new().with("k", 1).with("j", true))
        .info("c");

    let lines = records(&console.info);
    assert_eq!(lines[0]["user"], "ada");
    assert_eq!(lines[1]["-"], "bare");
    assert_eq!(lines[2]["k"], 1);
    assert_eq!(lines[2]["j"], true);
    assert!(registry.logger().fields().is_empty());
}

#[test]
fn test_at_level() {
    let console = Console::new();
    let registry = Registry::new();
    registry.configure(console.json()).unwrap();
    console.clear();

    registry
        .at_level(Level::Warn, "runtime level", vec![field("n", 1)])
        .unwrap();
    let escalation = registry
        .at_level(Level::Panic, "escalated", Vec::new())
        .unwrap_err();

    assert_eq!(escalation.message(), "escalated");
    let errors = records(&console.error);
    assert_eq!(errors[0]["lvl"], "warn");
    assert_eq!(errors[1]["lvl"], "panic");
}

#[test]
fn test_context_association() {
    let console = Console::new();
    let registry = Registry::new();
    registry.configure(console.json()).unwrap();

    let bare = Context::new();
    let attached = registry.context_with_logger(&bare);
    let custom = bare.with_logger(registry.with_field("scope", "custom"));
    console.clear();

    registry.from_context(&bare).info("fallback");
    registry.from_context(&attached).info("attached");
    registry.from_context(&custom).info("custom");

    let lines = records(&console.info);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].get("scope").is_none());
    assert_eq!(lines[2]["scope"], "custom");
}

#[test]
fn test_concurrent_logging_during_reconfigure() {
    let console = Console::new();
    let registry = Arc::new(Registry::new());
    registry.configure(console.json()).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    registry
                        .logger()
                        .infov("tick", [field("t", t), field("i", i)]);
                }
            })
        })
        .collect();
    for _ in 0..20 {
        registry.configure(console.json()).unwrap();
    }
    for writer in writers {
        writer.join().unwrap();
    }

    let ticks = records(&console.info)
        .into_iter()
        .filter(|r| r["msg"] == "tick")
        .count();
    assert_eq!(ticks, 4 * 500);
}
