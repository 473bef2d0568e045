use std::path::Path;
use std::time::Duration;

use tempfile::tempdir;

use crate::component::rundown::RundownWait;
use crate::config::error::ConfigError;
use crate::config::{ConfigFormat, EngineConfig, RundownStrategy};

#[test]
fn test_default_config() {
    let config = EngineConfig::default();
    assert!(!config.trace_visits);
    assert_eq!(config.rundown.strategy, RundownStrategy::Notify);
    assert_eq!(config.rundown.poll_interval_ms, 50);
    assert_eq!(config.rundown_wait(), RundownWait::Notify);
    assert!(config.validate().is_ok());
}

#[test]
fn test_format_from_path() {
    assert_eq!(ConfigFormat::from_path(Path::new("engine.json")), Some(ConfigFormat::Json));
    assert_eq!(ConfigFormat::from_path(Path::new("engine.TOML")), Some(ConfigFormat::Toml));
    assert_eq!(ConfigFormat::from_path(Path::new("engine.yml")), Some(ConfigFormat::Yaml));
    assert_eq!(ConfigFormat::from_path(Path::new("engine.yaml")), Some(ConfigFormat::Yaml));
    assert_eq!(ConfigFormat::from_path(Path::new("engine.ini")), None);
    assert_eq!(ConfigFormat::from_path(Path::new("engine")), None);
}

#[test]
fn test_parse_json_with_missing_keys() {
    let config = EngineConfig::parse(r#"{ "rundown": { "strategy": "poll" } }"#, ConfigFormat::Json)
        .expect("partial JSON should parse");
    assert_eq!(config.rundown.strategy, RundownStrategy::Poll);
    assert_eq!(config.rundown.poll_interval_ms, 50); // default kept
    assert_eq!(config.rundown_wait(), RundownWait::Poll(Duration::from_millis(50)));
}

#[test]
fn test_parse_toml_and_yaml() {
    let toml_doc = "trace_visits = true\n\n[rundown]\nstrategy = \"poll\"\npoll_interval_ms = 5\n";
    let from_toml = EngineConfig::parse(toml_doc, ConfigFormat::Toml).expect("TOML should parse");
    assert!(from_toml.trace_visits);
    assert_eq!(from_toml.rundown.poll_interval_ms, 5);

    let yaml_doc = "trace_visits: true\nrundown:\n  strategy: poll\n  poll_interval_ms: 5\n";
    let from_yaml = EngineConfig::parse(yaml_doc, ConfigFormat::Yaml).expect("YAML should parse");
    assert_eq!(from_toml, from_yaml);
}

#[test]
fn test_render_then_parse_toml() {
    let mut config = EngineConfig::default();
    config.trace_visits = true;
    let rendered = config.render(ConfigFormat::Toml).expect("render should succeed");
    assert!(rendered.contains("[rundown]"));
    let reparsed = EngineConfig::parse(&rendered, ConfigFormat::Toml).unwrap();
    assert_eq!(reparsed, config);
}

#[test]
fn test_zero_poll_interval_rejected() {
    let result = EngineConfig::parse(r#"{ "rundown": { "poll_interval_ms": 0 } }"#, ConfigFormat::Json);
    match result {
        Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "rundown.poll_interval_ms"),
        other => panic!("expected Invalid error, got {:?}", other),
    }
}

#[test]
fn test_unknown_strategy_is_deserialization_error() {
    let result = EngineConfig::parse(r#"{ "rundown": { "strategy": "spin" } }"#, ConfigFormat::Json);
    assert!(matches!(result, Err(ConfigError::Deserialization { ref format, .. }) if format == "JSON"));
}

#[test]
fn test_load_from_file() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("engine.yaml");
    std::fs::write(&path, "rundown:\n  strategy: poll\n  poll_interval_ms: 20\n").unwrap();

    let config = EngineConfig::load(&path).expect("load should succeed");
    assert_eq!(config.rundown_wait(), RundownWait::Poll(Duration::from_millis(20)));

    let explicit = EngineConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(explicit, config);
}

#[test]
fn test_load_errors() {
    let dir = tempdir().expect("Failed to create temp directory");

    let unsupported = dir.path().join("engine.ini");
    std::fs::write(&unsupported, "x=1").unwrap();
    assert!(matches!(
        EngineConfig::load(&unsupported),
        Err(ConfigError::UnsupportedFormat { .. })
    ));

    let missing = dir.path().join("missing.json");
    let err = EngineConfig::load(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("missing.json"));
}
