//! Kafka session with per-topic cached client handles.
//!
//! A [`KafkaKerberosSession`] owns the resolved settings, the Kerberos
//! credential state, and one lazily created producer and consumer per
//! topic. Handles are constructed at most once per (role, topic) and are
//! released when [`close`](KafkaKerberosSession::close) runs or the
//! session is dropped.
//!
//! The caches are internally locked so shared references work across
//! tasks, but the credential environment is process-wide: run one session
//! per process (see [`crate::kerberos`]).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rdkafka::consumer::StreamConsumer;
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::ResolvedSettings;
use crate::error::{ClientError, ConsumeError, ProduceError, Result};
use crate::kafka::{
    build_kafka_consumer, build_kafka_producer, subscribe_consumer, ClientRole,
};
use crate::kerberos;

/// Bounded wait for a delivery acknowledgment, matching the producer's
/// `message.timeout.ms`.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-message handler invoked during consumption.
///
/// A handler failure is logged and swallowed; it never aborts the poll loop.
type MessageHandler<'a> = &'a mut dyn FnMut(&Value) -> anyhow::Result<()>;

/// Kafka session with Kerberos authentication and per-topic handle caches.
pub struct KafkaKerberosSession {
    settings: ResolvedSettings,
    jaas_path: PathBuf,
    producers: RwLock<HashMap<String, Arc<FutureProducer>>>,
    consumers: RwLock<HashMap<String, Arc<StreamConsumer>>>,
}

impl KafkaKerberosSession {
    /// Creates a session from the process environment and an optional
    /// config file: resolve, validate, then set up credentials.
    ///
    /// Any failure here is fatal; no client handle exists until this
    /// returns `Ok`.
    pub fn connect(config_file: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();
        let settings = ResolvedSettings::from_process_env(config_file)?;
        Self::with_settings(settings)
    }

    /// Creates a session from pre-resolved settings.
    pub fn with_settings(settings: ResolvedSettings) -> Result<Self> {
        settings.validate()?;
        let jaas_path = kerberos::setup_credentials(&settings)?;

        info!(
            brokers = %settings.bootstrap_servers,
            topic = %settings.topic,
            "Kafka session initialized"
        );

        Ok(KafkaKerberosSession {
            settings,
            jaas_path,
            producers: RwLock::new(HashMap::new()),
            consumers: RwLock::new(HashMap::new()),
        })
    }

    /// The immutable settings this session was built from.
    pub fn settings(&self) -> &ResolvedSettings {
        &self.settings
    }

    /// The JAAS configuration path in effect for this session.
    pub fn jaas_config_path(&self) -> &Path {
        &self.jaas_path
    }

    fn target_topic<'a>(&'a self, topic: Option<&'a str>) -> &'a str {
        topic.unwrap_or(&self.settings.topic)
    }

    /// Gets or creates the producer handle for a topic.
    ///
    /// Construction happens at most once per topic; cache hits return the
    /// stored handle unchanged.
    pub async fn producer(&self, topic: Option<&str>) -> Result<Arc<FutureProducer>> {
        let topic = self.target_topic(topic);

        {
            let producers = self.producers.read().await;
            if let Some(handle) = producers.get(topic) {
                return Ok(Arc::clone(handle));
            }
        }

        let mut producers = self.producers.write().await;
        // Re-check after acquiring the write lock.
        if let Some(handle) = producers.get(topic) {
            return Ok(Arc::clone(handle));
        }

        let producer =
            build_kafka_producer(&self.settings).map_err(|source| ClientError::ConnectFailed {
                role: ClientRole::Producer,
                topic: topic.to_string(),
                source,
            })?;

        let handle = Arc::new(producer);
        producers.insert(topic.to_string(), Arc::clone(&handle));
        info!(topic = %topic, "created producer for topic");
        Ok(handle)
    }

    /// Gets or creates the consumer handle for a topic, subscribed to it.
    pub async fn consumer(&self, topic: Option<&str>) -> Result<Arc<StreamConsumer>> {
        let topic = self.target_topic(topic);

        {
            let consumers = self.consumers.read().await;
            if let Some(handle) = consumers.get(topic) {
                return Ok(Arc::clone(handle));
            }
        }

        let mut consumers = self.consumers.write().await;
        if let Some(handle) = consumers.get(topic) {
            return Ok(Arc::clone(handle));
        }

        let connect_failed = |source: KafkaError| ClientError::ConnectFailed {
            role: ClientRole::Consumer,
            topic: topic.to_string(),
            source,
        };
        let consumer = build_kafka_consumer(&self.settings).map_err(connect_failed)?;
        subscribe_consumer(&consumer, topic).map_err(connect_failed)?;

        let handle = Arc::new(consumer);
        consumers.insert(topic.to_string(), Arc::clone(&handle));
        info!(topic = %topic, "created consumer for topic");
        Ok(handle)
    }

    /// Produces a JSON message, waiting up to the send ceiling for the
    /// delivery acknowledgment. Returns the assigned (partition, offset).
    pub async fn produce(
        &self,
        payload: &Value,
        key: Option<&str>,
        topic: Option<&str>,
    ) -> Result<(i32, i64)> {
        let topic_name = self.target_topic(topic).to_string();
        let producer = self.producer(Some(&topic_name)).await?;

        let encoded =
            serde_json::to_string(payload).map_err(|err| ProduceError::Rejected {
                topic: topic_name.clone(),
                reason: format!("payload serialization failed: {err}"),
            })?;

        let mut record: FutureRecord<'_, str, String> =
            FutureRecord::to(&topic_name).payload(&encoded);
        if let Some(key) = key {
            record = record.key(key);
        }

        match producer.send(record, SEND_TIMEOUT).await {
            Ok(delivery) => {
                info!(
                    topic = %topic_name,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "message sent successfully"
                );
                Ok((delivery.partition, delivery.offset))
            }
            Err((err, _)) => {
                error!(topic = %topic_name, error = %err, "failed to produce message");
                if matches!(
                    err,
                    KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut)
                ) {
                    Err(ProduceError::Timeout {
                        topic: topic_name,
                        source: err,
                    }
                    .into())
                } else {
                    Err(ProduceError::Rejected {
                        topic: topic_name,
                        reason: err.to_string(),
                    }
                    .into())
                }
            }
        }
    }

    /// Consumes messages until `max_messages` is reached or a poll comes
    /// back empty, whichever is first. Returns messages in arrival order.
    ///
    /// `max_messages` defaults to the configured `max_poll_records`; the
    /// loop never blocks past `poll_timeout` once the topic runs dry.
    /// Records with no payload (tombstones) are skipped, logged at debug
    /// level, and do not count toward `max_messages`.
    pub async fn consume(
        &self,
        topic: Option<&str>,
        max_messages: Option<usize>,
        poll_timeout: Duration,
    ) -> Result<Vec<Value>> {
        self.consume_inner(topic, max_messages, poll_timeout, None)
            .await
    }

    /// Like [`consume`](Self::consume), invoking `handler` for each record.
    ///
    /// A handler error is logged and does not interrupt the loop.
    pub async fn consume_with_handler<F>(
        &self,
        topic: Option<&str>,
        max_messages: Option<usize>,
        poll_timeout: Duration,
        mut handler: F,
    ) -> Result<Vec<Value>>
    where
        F: FnMut(&Value) -> anyhow::Result<()>,
    {
        self.consume_inner(topic, max_messages, poll_timeout, Some(&mut handler))
            .await
    }

    async fn consume_inner(
        &self,
        topic: Option<&str>,
        max_messages: Option<usize>,
        poll_timeout: Duration,
        mut handler: Option<MessageHandler<'_>>,
    ) -> Result<Vec<Value>> {
        let topic_name = self.target_topic(topic).to_string();
        let consumer = self.consumer(Some(&topic_name)).await?;
        let limit = max_messages.unwrap_or(self.settings.max_poll_records);

        let mut messages: Vec<Value> = Vec::new();
        while messages.len() < limit {
            let received = match tokio::time::timeout(poll_timeout, consumer.recv()).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(
                        topic = %topic_name,
                        consumed = messages.len(),
                        "no messages within poll timeout"
                    );
                    break;
                }
            };

            let message = received.map_err(|err| ConsumeError::PollFailed {
                topic: topic_name.clone(),
                reason: err.to_string(),
            })?;

            let Some(value) = decode_payload(message.payload()).map_err(|reason| {
                ConsumeError::PollFailed {
                    topic: topic_name.clone(),
                    reason,
                }
            })?
            else {
                debug!(
                    topic = %topic_name,
                    partition = message.partition(),
                    offset = message.offset(),
                    "skipping record with empty payload"
                );
                continue;
            };

            info!(
                topic = %topic_name,
                partition = message.partition(),
                offset = message.offset(),
                "received message"
            );

            if let Some(handler) = handler.as_deref_mut() {
                if let Err(err) = handler(&value) {
                    error!(topic = %topic_name, error = %err, "message handler error");
                }
            }

            messages.push(value);
        }

        info!(
            topic = %topic_name,
            count = messages.len(),
            "finished consuming messages"
        );
        Ok(messages)
    }

    /// Flushes and releases every cached handle and clears both caches.
    ///
    /// Errors during close are logged, never returned. Dropping the
    /// session has the same effect on the underlying connections, so a
    /// partially initialized session cannot leak sockets.
    pub async fn close(&self) {
        let mut producers = self.producers.write().await;
        for (topic, producer) in producers.drain() {
            if let Err(err) = producer.flush(SEND_TIMEOUT) {
                warn!(topic = %topic, error = %err, "failed to flush producer on close");
            }
            info!(topic = %topic, "closed producer for topic");
        }

        let mut consumers = self.consumers.write().await;
        for (topic, _consumer) in consumers.drain() {
            info!(topic = %topic, "closed consumer for topic");
        }
    }
}

/// Decodes a record payload as JSON. Absent payloads yield `None`.
fn decode_payload(payload: Option<&[u8]>) -> std::result::Result<Option<Value>, String> {
    let Some(payload) = payload else {
        return Ok(None);
    };
    let text = std::str::from_utf8(payload)
        .map_err(|err| format!("payload is not valid UTF-8: {err}"))?;
    serde_json::from_str(text)
        .map(Some)
        .map_err(|err| format!("payload is not valid JSON: {err}"))
}
