// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use avalanche_node::config::ProcessorConfig;
use avalanche_node::errors::NodeError;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_defaults_are_valid() {
    let cfg = ProcessorConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.query_timeout(), Duration::from_secs(10));

    let pm = cfg.peer_manager_config();
    assert_eq!(pm.conflicting_proof_cooldown, Duration::from_secs(60));
    assert_eq!(pm.peer_replacement_cooldown, Duration::from_secs(3600));
    assert!(!pm.proof_replacement_enabled);
}

#[test]
fn test_partial_json_overrides() {
    let cfg = ProcessorConfig::from_json_str(r#"{ "dust_threshold": 5, "proof_replacement_enabled": true }"#).unwrap();
    assert_eq!(cfg.dust_threshold, 5);
    assert!(cfg.proof_replacement_enabled);
    assert_eq!(cfg.max_orphan_stakes, ProcessorConfig::default().max_orphan_stakes);
    assert_eq!(cfg.peer_manager_config().dust_threshold, 5);
}

#[test]
fn test_rejects_bad_config() {
    assert!(matches!(
        ProcessorConfig::from_json_str(r#"{ "query_timeout_ms": 0 }"#),
        Err(NodeError::InvalidConfig(_))
    ));
    assert!(matches!(ProcessorConfig::from_json_str("{ nope"), Err(NodeError::ConfigParse(_))));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "max_orphan_stakes": 42 }}"#).unwrap();
    let cfg = ProcessorConfig::from_file(file.path()).unwrap();
    assert_eq!(cfg.max_orphan_stakes, 42);

    assert!(matches!(ProcessorConfig::from_file("/nonexistent/avalanche.json"), Err(NodeError::Io(_))));
}
