//! Shared Kafka client configuration.

use parlor_config::KafkaConfig;
use rdkafka::ClientConfig;

/// Base client configuration applied to both the producer and the consumer.
///
/// SASL/SSL settings are only attached when credentials are configured;
/// `AppConfig::validate` has already rejected half-provided credentials.
pub fn create_client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config.set("bootstrap.servers", &config.brokers);

    if let (Some(username), Some(password)) = (&config.sasl_username, &config.sasl_password) {
        client_config
            .set("security.protocol", "SASL_SSL")
            .set("sasl.mechanism", "PLAIN")
            .set("sasl.username", username)
            .set("sasl.password", password);
    }

    if let Some(ca_location) = &config.ssl_ca_location {
        client_config.set("ssl.ca.location", ca_location);
    }

    client_config
}
