//! Kafka producer configuration trait.
//!
//! Defines the producer-side configuration view; the session settings
//! implement this to derive a producer `ClientConfig`.

/// Producer-side configuration view.
///
/// Delivery-acknowledgment settings default to the strictest profile:
/// every replica must acknowledge and in-flight requests are serialized,
/// so retries cannot reorder messages.
pub trait KafkaProducerConfig: Send + Sync {
    /// Kafka bootstrap servers address list.
    fn kafka_bootstrap(&self) -> &str;

    /// Broker security protocol, default `SASL_PLAINTEXT`.
    fn security_protocol(&self) -> &str {
        "SASL_PLAINTEXT"
    }

    /// Kerberos service name, default `kafka`.
    fn kerberos_service_name(&self) -> &str {
        "kafka"
    }

    /// Keytab used by the GSSAPI mechanism; `None` disables the SASL keys.
    fn kerberos_keytab(&self) -> Option<&str> {
        None
    }

    /// Principal used by the GSSAPI mechanism.
    fn kerberos_principal(&self) -> Option<&str> {
        None
    }

    /// Delivery timeout in milliseconds, default 10000.
    fn message_timeout_ms(&self) -> u64 {
        10_000
    }

    /// Acknowledgment level, default `all`.
    fn acks(&self) -> &str {
        "all"
    }

    /// Send retries performed by the client, default 3.
    fn retries(&self) -> u32 {
        3
    }

    /// Maximum unacknowledged requests per connection, default 1.
    fn max_in_flight(&self) -> u32 {
        1
    }
}
