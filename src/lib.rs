//! Kafka Kerberos Utility Library
//!
//! Provides Kafka connection setup with Kerberos (GSSAPI) authentication via
//! keytab files: configuration resolution from environment variables and an
//! optional config file, JAAS login-module generation, per-topic cached
//! producers and consumers, and produce/consume convenience methods.

pub mod config;
pub mod error;
pub mod kerberos;
pub mod logging;
pub mod session;

// Kafka 工具模块
pub mod kafka;

// Re-exports
pub use config::ResolvedSettings;
pub use error::{
    ClientError, ConfigError, ConsumeError, CredentialError, KafkaUtilityError, ProduceError,
    Result,
};
pub use kerberos::{default_jaas_path, setup_credentials};
pub use logging::init_logging;
pub use session::KafkaKerberosSession;

// Kafka 工具 re-exports
pub use kafka::{
    build_kafka_consumer, build_kafka_producer, subscribe_consumer, ClientRole,
    KafkaConsumerConfig, KafkaProducerConfig,
};
