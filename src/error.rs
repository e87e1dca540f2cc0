//! Unified error types for the Kafka Kerberos utility.
//!
//! Every fallible operation surfaces a [`KafkaUtilityError`] wrapping the
//! specific cause. The only swallowed failure in the whole crate is a
//! per-message handler error during consumption, which is logged and does
//! not interrupt the poll loop.

use std::path::PathBuf;

use rdkafka::error::KafkaError;
use thiserror::Error;

use crate::kafka::ClientRole;

/// Configuration resolution and validation errors.
///
/// These are fatal at session construction: no client handle is created
/// once any of them is raised.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required settings are absent from both the environment
    /// and the config file. All missing fields are reported together.
    #[error("missing required configuration parameters: {}", .fields.join(", "))]
    MissingRequired { fields: Vec<String> },

    /// The keytab path is set but the file does not exist on disk.
    #[error("keytab file not found: {}", .path.display())]
    KeytabNotFound { path: PathBuf },

    /// The broker address field is present but holds no broker entries.
    #[error("bootstrap servers cannot be empty")]
    EmptyBrokerList,

    /// A numeric setting could not be parsed as an integer.
    #[error("invalid numeric value for {field}: {value:?}")]
    InvalidNumeric { field: &'static str, value: String },

    /// The config file exists but could not be read or parsed.
    #[error("failed to load config file {}: {reason}", .path.display())]
    FileInvalid { path: PathBuf, reason: String },
}

/// Kerberos credential setup errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The JAAS configuration file could not be written.
    #[error("failed to write JAAS configuration to {}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The Kerberos environment could not be prepared.
    #[error("failed to set up Kerberos authentication: {0}")]
    SetupFailed(String),
}

/// Client handle construction errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying rdkafka client could not be created or subscribed.
    #[error("failed to create {role} for topic {topic}")]
    ConnectFailed {
        role: ClientRole,
        topic: String,
        #[source]
        source: KafkaError,
    },
}

/// Message production errors.
#[derive(Debug, Error)]
pub enum ProduceError {
    /// Delivery was not acknowledged within the send ceiling.
    #[error("message delivery to topic {topic} timed out")]
    Timeout {
        topic: String,
        #[source]
        source: KafkaError,
    },

    /// The broker rejected the message, or the payload could not be encoded.
    #[error("message delivery to topic {topic} failed: {reason}")]
    Rejected { topic: String, reason: String },
}

/// Message consumption errors.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// A poll returned a client error, or a record payload was undecodable.
    #[error("poll failed on topic {topic}: {reason}")]
    PollFailed { topic: String, reason: String },
}

/// Top-level error type wrapping every failure category of this crate.
#[derive(Debug, Error)]
pub enum KafkaUtilityError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Produce(#[from] ProduceError),

    #[error(transparent)]
    Consume(#[from] ConsumeError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KafkaUtilityError>;
