//! Test plan for the `parlor-config` crate.
//!
//! Exercises the configuration loader across default handling, file
//! discovery, environment overrides, and startup validation.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use parlor_config::{load, AppConfig};

const ENV_VARS_TO_RESET: &[&str] = &[
    "PARLOR_CONFIG",
    "PARLOR__HTTP__ADDRESS",
    "PARLOR__HTTP__PORT",
    "PARLOR__DATABASE__URL",
    "PARLOR__DATABASE__MAX_CONNECTIONS",
    "PARLOR__REDIS__URL",
    "PARLOR__REDIS__CHANNEL",
    "PARLOR__KAFKA__BROKERS",
    "PARLOR__KAFKA__TOPIC",
    "PARLOR__KAFKA__GROUP",
    "PARLOR__KAFKA__RESUME_DELAY_SECONDS",
    "PARLOR__KAFKA__MAX_ATTEMPTS",
    "PARLOR__KAFKA__SASL_USERNAME",
    "PARLOR__KAFKA__SASL_PASSWORD",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        let mut ctx = Self {
            vars: Vec::new(),
            original_dir: None,
        };
        for key in ENV_VARS_TO_RESET {
            ctx.remove_var(key);
        }
        ctx
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn set_current_dir(&mut self, dir: &Path) {
        if self.original_dir.is_none() {
            self.original_dir =
                Some(std::env::current_dir().expect("failed to capture current directory"));
        }
        std::env::set_current_dir(dir).expect("failed to set current directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(original) = self.original_dir.take() {
            let _ = std::env::set_current_dir(original);
        }

        while let Some((key, value)) = self.vars.pop() {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(path, contents).expect("failed to write config file");
}

#[test]
#[serial]
fn load_uses_default_values_when_no_files_found() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.set_current_dir(temp_dir.path());

    let config = load().expect("defaults should load");

    assert_eq!(config.http.port, 7070);
    assert_eq!(config.redis.channel, "chat-message");
    assert_eq!(config.kafka.topic, "MESSAGES");
    assert_eq!(config.kafka.group, "default");
    assert_eq!(config.kafka.resume_delay_seconds, 60);
    assert_eq!(config.kafka.max_attempts, 3);
}

#[test]
#[serial]
fn load_reads_discovered_config_file() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    write_config_file(
        temp_dir.path(),
        "parlor.toml",
        r#"
[kafka]
brokers = "broker-1:9092,broker-2:9092"
topic = "CHAT_EVENTS"

[redis]
url = "redis://cache:6379"
"#,
    );
    ctx.set_current_dir(temp_dir.path());

    let config = load().expect("file-backed configuration should load");

    assert_eq!(config.kafka.brokers, "broker-1:9092,broker-2:9092");
    assert_eq!(config.kafka.topic, "CHAT_EVENTS");
    assert_eq!(config.redis.url, "redis://cache:6379");
    // Untouched sections keep their defaults.
    assert_eq!(config.database.max_connections, 10);
}

#[test]
#[serial]
fn load_honors_explicit_config_path() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    write_config_file(
        temp_dir.path(),
        "elsewhere/custom.toml",
        r#"
[http]
port = 9191
"#,
    );
    ctx.set_var(
        "PARLOR_CONFIG",
        temp_dir.path().join("elsewhere/custom.toml").to_string_lossy(),
    );

    let config = load().expect("explicit configuration should load");
    assert_eq!(config.http.port, 9191);
}

#[test]
#[serial]
fn environment_overrides_take_precedence_over_files() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    write_config_file(
        temp_dir.path(),
        "parlor.toml",
        r#"
[kafka]
group = "from-file"
"#,
    );
    ctx.set_current_dir(temp_dir.path());
    ctx.set_var("PARLOR__KAFKA__GROUP", "from-env");
    ctx.set_var("PARLOR__REDIS__CHANNEL", "chat-message-staging");

    let config = load().expect("configuration should load");

    assert_eq!(config.kafka.group, "from-env");
    assert_eq!(config.redis.channel, "chat-message-staging");
}

#[test]
#[serial]
fn load_rejects_empty_broker_list() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.set_current_dir(temp_dir.path());
    ctx.set_var("PARLOR__KAFKA__BROKERS", "");

    let error = load().expect_err("empty broker list must be fatal");
    assert!(
        format!("{error:?}").contains("kafka.brokers"),
        "expected broker validation failure, got {error:?}"
    );
}

#[test]
#[serial]
fn load_rejects_partial_sasl_credentials() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.set_current_dir(temp_dir.path());
    ctx.set_var("PARLOR__KAFKA__SASL_USERNAME", "avnadmin");

    let error = load().expect_err("username without password must be fatal");
    assert!(
        format!("{error:?}").contains("SASL"),
        "expected SASL validation failure, got {error:?}"
    );
}

#[test]
fn dead_letter_topic_derives_from_main_topic() {
    let config = AppConfig::default();
    assert_eq!(config.kafka.dead_letter_topic(), "MESSAGES-dlq");

    let mut custom = AppConfig::default();
    custom.kafka.dead_letter_topic = Some("quarantine".into());
    assert_eq!(custom.kafka.dead_letter_topic(), "quarantine");
}

#[test]
fn validate_requires_positive_attempt_budget() {
    let mut config = AppConfig::default();
    config.kafka.max_attempts = 0;
    assert!(config.validate().is_err());
}
