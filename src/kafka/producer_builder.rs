//! Kafka producer builder.
//!
//! Derives a producer `ClientConfig` from a [`KafkaProducerConfig`] view
//! and constructs the underlying `FutureProducer`.

use rdkafka::config::ClientConfig;
use rdkafka::producer::FutureProducer;
use tracing::info;

use crate::kafka::producer_config::KafkaProducerConfig;

/// Builds a Kafka producer from the given configuration view.
///
/// GSSAPI keys are only applied when the view carries a keytab, so
/// non-SASL protocols (e.g. `PLAINTEXT` against a local broker) stay
/// usable for testing.
pub fn build_kafka_producer(
    config: &dyn KafkaProducerConfig,
) -> Result<FutureProducer, rdkafka::error::KafkaError> {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", config.kafka_bootstrap())
        .set("security.protocol", config.security_protocol())
        .set("message.timeout.ms", config.message_timeout_ms().to_string())
        .set("acks", config.acks())
        .set("retries", config.retries().to_string())
        .set(
            "max.in.flight.requests.per.connection",
            config.max_in_flight().to_string(),
        );

    apply_gssapi_keys(&mut client_config, config);

    let producer: FutureProducer = client_config.create()?;

    info!(
        bootstrap = %config.kafka_bootstrap(),
        protocol = %config.security_protocol(),
        timeout_ms = config.message_timeout_ms(),
        "Kafka producer created successfully"
    );

    Ok(producer)
}

fn apply_gssapi_keys(client_config: &mut ClientConfig, config: &dyn KafkaProducerConfig) {
    if let (Some(keytab), Some(principal)) =
        (config.kerberos_keytab(), config.kerberos_principal())
    {
        client_config
            .set("sasl.mechanism", "GSSAPI")
            .set("sasl.kerberos.service.name", config.kerberos_service_name())
            .set("sasl.kerberos.keytab", keytab)
            .set("sasl.kerberos.principal", principal);
    }
}
