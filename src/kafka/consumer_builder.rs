//! Kafka consumer builder.
//!
//! Derives a consumer `ClientConfig` from a [`KafkaConsumerConfig`] view,
//! constructs the underlying `StreamConsumer`, and subscribes it to a topic.

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use tracing::info;

use crate::kafka::consumer_config::KafkaConsumerConfig;

/// Builds a Kafka consumer from the given configuration view.
///
/// The consumer is not subscribed yet; see [`subscribe_consumer`].
pub fn build_kafka_consumer(
    config: &dyn KafkaConsumerConfig,
) -> Result<StreamConsumer, rdkafka::error::KafkaError> {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", config.kafka_bootstrap())
        .set("security.protocol", config.security_protocol())
        .set("group.id", config.consumer_group())
        .set("auto.offset.reset", config.auto_offset_reset())
        .set(
            "enable.auto.commit",
            config.enable_auto_commit().to_string(),
        )
        .set(
            "auto.commit.interval.ms",
            config.auto_commit_interval_ms().to_string(),
        )
        .set("session.timeout.ms", config.session_timeout_ms().to_string())
        .set(
            "heartbeat.interval.ms",
            config.heartbeat_interval_ms().to_string(),
        );

    if let (Some(keytab), Some(principal)) =
        (config.kerberos_keytab(), config.kerberos_principal())
    {
        client_config
            .set("sasl.mechanism", "GSSAPI")
            .set("sasl.kerberos.service.name", config.kerberos_service_name())
            .set("sasl.kerberos.keytab", keytab)
            .set("sasl.kerberos.principal", principal);
    }

    let consumer: StreamConsumer = client_config.create()?;

    info!(
        bootstrap = %config.kafka_bootstrap(),
        group = %config.consumer_group(),
        offset_reset = %config.auto_offset_reset(),
        "Kafka consumer created successfully"
    );

    Ok(consumer)
}

/// Subscribes the consumer to a single topic.
pub fn subscribe_consumer(
    consumer: &StreamConsumer,
    topic: &str,
) -> Result<(), rdkafka::error::KafkaError> {
    consumer.subscribe(&[topic])?;
    info!(topic = %topic, "subscribed to Kafka topic");
    Ok(())
}
