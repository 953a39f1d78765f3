/*!
 * Configuration and Bootstrap Tests
 * Environment loading and first-run capsule generation
 */

use capsule_gate::sandbox::TemplateDocument;
use capsule_gate::{scaffold_capsule, ConfigError, GatewayConfig, TraversalPolicy};
use serial_test::serial;
use std::path::PathBuf;
use std::time::Duration;

const VARS: [&str; 6] = [
    "CAPSULE_CONFIG",
    "CAPSULE_LOC",
    "CAPSULE_EXTRA",
    "CAPSULE_COMMAND_TIMEOUT",
    "CAPSULE_TRAVERSAL",
    "CAPSULE_SCAFFOLD",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_load_defaults() {
    clear_env();
    let config = GatewayConfig::load().unwrap();

    assert_eq!(config.default_capsule, PathBuf::from("capsule"));
    assert!(config.capsules.is_empty());
    assert_eq!(config.command_timeout, Some(Duration::from_secs(300)));
    assert_eq!(config.traversal, TraversalPolicy::Reject);
}

#[test]
#[serial]
fn test_env_overrides_config_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("gateway.json");
    std::fs::write(
        &file,
        r#"{"default_capsule": "/srv/file", "capsules": ["/srv/x"], "traversal": "strip"}"#,
    )
    .unwrap();

    std::env::set_var("CAPSULE_CONFIG", &file);
    std::env::set_var("CAPSULE_LOC", "/srv/env");
    std::env::set_var("CAPSULE_COMMAND_TIMEOUT", "12");
    let config = GatewayConfig::load();
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.default_capsule, PathBuf::from("/srv/env"));
    assert_eq!(config.capsules, vec![PathBuf::from("/srv/x")]);
    assert_eq!(config.traversal, TraversalPolicy::Strip);
    assert_eq!(config.command_timeout, Some(Duration::from_secs(12)));
}

#[test]
#[serial]
fn test_invalid_config_is_reported() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("gateway.json");
    std::fs::write(&file, "not json").unwrap();

    std::env::set_var("CAPSULE_CONFIG", &file);
    let result = GatewayConfig::load();
    clear_env();
    assert!(matches!(result, Err(ConfigError::Parse { .. })));

    std::env::set_var("CAPSULE_LOC", "/srv/a");
    std::env::set_var("CAPSULE_EXTRA", "/srv/a");
    let result = GatewayConfig::load();
    clear_env();
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_scaffold_creates_usable_capsule() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("capsule");

    assert!(scaffold_capsule(&root).unwrap());
    assert!(!scaffold_capsule(&root).unwrap(), "existing capsule is left alone");

    for file in ["host", "commands", "group", "content/main.gmi"] {
        assert!(root.join(file).is_file(), "missing {}", file);
    }
    assert!(root.join("bin").is_dir());

    let commands = std::fs::read_to_string(root.join("commands")).unwrap();
    let active: Vec<&str> = commands
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
        .collect();
    assert_eq!(active, vec!["tpl"]);

    let main = std::fs::read_to_string(root.join("content/main.gmi")).unwrap();
    assert!(TemplateDocument::parse(&main).is_ok());
}

#[cfg(unix)]
#[test]
fn test_scaffold_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("capsule");
    scaffold_capsule(&root).unwrap();

    let mode = std::fs::metadata(&root).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o700);
}

#[test]
#[serial]
fn test_identity_ignores_session_environment() {
    std::env::set_var("CAPSULE_IDENT", "ssh-ed25519 AAAAadmin");
    let identity = capsule_gate::session::authenticated_identity(None);
    std::env::remove_var("CAPSULE_IDENT");

    assert_eq!(identity, capsule_gate::Identity::anonymous());
}
