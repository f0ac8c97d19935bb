//! Integration tests for sickle-config crate.

use sickle_config::{feed_channel_name, ConfigCache, ConfigLoader, ConfigValidator};
use std::io::Write;

const SAMPLE: &str = r#"
core:
  discord_token: "file-token"
  admin_user_id: 1234
  debug_channel_id: 5678
  cmd_prefix: "!"
  db_path: "data/db.json"
relay:
  api_port: 46000
  channel_capacity: 8
tasks:
  engagement_enabled: true
  engagement_interval_hours: 12
"#;

#[test]
fn test_read_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();

    let config = ConfigLoader::read_file(file.path()).unwrap();
    assert_eq!(config.core.discord_token, "file-token");
    assert_eq!(config.core.admin_user_id.get(), 1234);
    assert_eq!(config.core.debug_channel_id.get(), 5678);
    assert_eq!(config.core.cmd_prefix, "!");
    assert_eq!(config.relay.api_port, 46000);
    assert_eq!(config.relay.feed_server_port, 44444);
    assert!(config.tasks.engagement_enabled);
    assert!(ConfigValidator::validate(&config).is_ok());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::read_file(&dir.path().join("nope.yaml")).unwrap_err();
    assert!(err.to_string().contains("nope.yaml"));
}

#[test]
fn test_malformed_yaml_is_rejected() {
    assert!(ConfigLoader::parse("core: [1, 2").is_err());
}

#[test]
fn test_config_cache() {
    let mut config = ConfigLoader::parse("core:\n  discord_token: abc\n  cmd_prefix: \"$\"\n").unwrap();
    config.core.is_debug = true;
    ConfigValidator::validate(&config).unwrap();

    let cache = ConfigCache::new(config);
    assert_eq!(cache.prefix(), "$");
    assert!(!cache.admin_user_id().is_set());
    assert_eq!(feed_channel_name(cache.get().core.is_debug), "debug-ot-feed");
    assert_eq!(feed_channel_name(false), "ot-feed");
}
