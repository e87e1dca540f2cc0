//! Kafka consumer configuration trait.
//!
//! Defines the consumer-side configuration view; the session settings
//! implement this to derive a consumer `ClientConfig`.

/// Consumer-side configuration view.
pub trait KafkaConsumerConfig: Send + Sync {
    /// Kafka bootstrap servers address list.
    fn kafka_bootstrap(&self) -> &str;

    /// Consumer group id.
    fn consumer_group(&self) -> &str;

    /// Default topic consumed by the owning session.
    fn kafka_topic(&self) -> &str;

    /// Offset reset policy, default `earliest`.
    fn auto_offset_reset(&self) -> &str {
        "earliest"
    }

    /// Whether offsets are committed automatically, default true.
    fn enable_auto_commit(&self) -> bool {
        true
    }

    /// Auto-commit interval in milliseconds, default 1000.
    fn auto_commit_interval_ms(&self) -> u64 {
        1000
    }

    /// Session timeout in milliseconds, default 30000.
    fn session_timeout_ms(&self) -> u64 {
        30_000
    }

    /// Heartbeat interval in milliseconds, default 3000.
    fn heartbeat_interval_ms(&self) -> u64 {
        3000
    }

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
}
