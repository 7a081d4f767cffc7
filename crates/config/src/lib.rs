use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "parlor.toml",
    "config/parlor.toml",
    "crates/config/parlor.toml",
    "../parlor.toml",
    "../config/parlor.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://parlor.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Fan-out bus settings: one shared channel on one Redis deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    /// Pub/sub channel every gateway instance subscribes to exactly once.
    #[serde(default = "RedisConfig::default_channel")]
    pub channel: String,
}

impl RedisConfig {
    fn default_channel() -> String {
        "chat-message".to_string()
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            channel: Self::default_channel(),
        }
    }
}

/// Durable log settings.
///
/// The SASL fields mirror what managed Kafka offerings require; they are all
/// optional for a local broker but must be provided together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub brokers: String,
    #[serde(default = "KafkaConfig::default_topic")]
    pub topic: String,
    #[serde(default = "KafkaConfig::default_group")]
    pub group: String,
    /// Records that exhaust their persistence attempt budget land here.
    #[serde(default)]
    pub dead_letter_topic: Option<String>,
    /// How long the consumer stays paused after a persistence failure.
    #[serde(default = "KafkaConfig::default_resume_delay")]
    pub resume_delay_seconds: u64,
    /// Attempts per record before it is diverted to the dead-letter topic.
    #[serde(default = "KafkaConfig::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub sasl_username: Option<String>,
    #[serde(default)]
    pub sasl_password: Option<String>,
    #[serde(default)]
    pub ssl_ca_location: Option<String>,
}

impl KafkaConfig {
    fn default_topic() -> String {
        "MESSAGES".to_string()
    }

    fn default_group() -> String {
        "default".to_string()
    }

    const fn default_resume_delay() -> u64 {
        60
    }

    const fn default_max_attempts() -> u32 {
        3
    }

    /// Dead-letter topic, derived from the main topic when not configured.
    pub fn dead_letter_topic(&self) -> String {
        self.dead_letter_topic
            .clone()
            .unwrap_or_else(|| format!("{}-dlq", self.topic))
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: Self::default_topic(),
            group: Self::default_group(),
            dead_letter_topic: None,
            resume_delay_seconds: Self::default_resume_delay(),
            max_attempts: Self::default_max_attempts(),
            sasl_username: None,
            sasl_password: None,
            ssl_ca_location: None,
        }
    }
}

impl AppConfig {
    /// Reject configurations the process cannot start with.
    ///
    /// Transport endpoints are required at startup; there is no runtime
    /// recovery from missing credentials.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.redis.url.trim().is_empty() {
            anyhow::bail!("redis.url must not be empty");
        }
        if self.redis.channel.trim().is_empty() {
            anyhow::bail!("redis.channel must not be empty");
        }
        if self.kafka.brokers.trim().is_empty() {
            anyhow::bail!("kafka.brokers must not be empty");
        }
        if self.kafka.topic.trim().is_empty() {
            anyhow::bail!("kafka.topic must not be empty");
        }
        if self.kafka.max_attempts == 0 {
            anyhow::bail!("kafka.max_attempts must be at least 1");
        }
        match (&self.kafka.sasl_username, &self.kafka.sasl_password) {
            (Some(_), None) | (None, Some(_)) => {
                anyhow::bail!("kafka SASL credentials require both username and password")
            }
            _ => {}
        }
        Ok(())
    }
}

/// Load the application configuration by combining defaults, files, and
/// environment overrides.
///
/// ```
/// use parlor_config::load;
///
/// std::env::remove_var("PARLOR_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert_eq!(config.redis.channel, "chat-message");
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )
        .unwrap()
        .set_default("redis.url", defaults.redis.url.clone())
        .unwrap()
        .set_default("redis.channel", defaults.redis.channel.clone())
        .unwrap()
        .set_default("kafka.brokers", defaults.kafka.brokers.clone())
        .unwrap()
        .set_default("kafka.topic", defaults.kafka.topic.clone())
        .unwrap()
        .set_default("kafka.group", defaults.kafka.group.clone())
        .unwrap()
        .set_default(
            "kafka.resume_delay_seconds",
            i64::try_from(defaults.kafka.resume_delay_seconds).unwrap_or(i64::MAX),
        )
        .unwrap()
        .set_default("kafka.max_attempts", i64::from(defaults.kafka.max_attempts))
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("PARLOR").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("PARLOR_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via PARLOR_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    config.validate().context("configuration rejected")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
