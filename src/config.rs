//! Kafka connection settings resolution and validation.
//!
//! Settings are merged from three layers with strict precedence:
//! environment variables override the `[kafka]` table of an optional TOML
//! config file, which overrides built-in defaults. The merged record is
//! immutable for the lifetime of the owning session.
//!
//! Recognized environment variables are the `[kafka]` table keys upper-cased
//! with a `KAFKA_` prefix, e.g. `bootstrap_servers` / `KAFKA_BOOTSTRAP_SERVERS`.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::ConfigError;
use crate::kafka::{KafkaConsumerConfig, KafkaProducerConfig};

/// Config file section holding the Kafka settings.
const CONFIG_SECTION: &str = "kafka";

/// Environment variable prefix for recognized settings.
const ENV_PREFIX: &str = "KAFKA_";

/// Every setting this crate recognizes, in config-file key form.
const RECOGNIZED_KEYS: [&str; 12] = [
    "bootstrap_servers",
    "topic",
    "keytab_path",
    "principal",
    "service_name",
    "security_protocol",
    "jaas_config_path",
    "consumer_group_id",
    "auto_offset_reset",
    "max_poll_records",
    "session_timeout_ms",
    "heartbeat_interval_ms",
];

/// Built-in defaults applied to keys absent from both sources.
const DEFAULTS: [(&str, &str); 7] = [
    ("service_name", "kafka"),
    ("security_protocol", "SASL_PLAINTEXT"),
    ("consumer_group_id", "kafka-utility-group"),
    ("auto_offset_reset", "earliest"),
    ("max_poll_records", "500"),
    ("session_timeout_ms", "30000"),
    ("heartbeat_interval_ms", "3000"),
];

/// Merged configuration record, built once at session start.
///
/// Required string fields hold an empty string when absent from every
/// source; [`ResolvedSettings::validate`] treats absent and empty
/// identically and reports all missing fields together.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    /// Comma-separated broker address list.
    pub bootstrap_servers: String,
    /// Default topic for produce/consume operations.
    pub topic: String,
    /// Path to the Kerberos keytab file.
    pub keytab_path: String,
    /// Kerberos principal, e.g. `user@REALM`.
    pub principal: String,
    /// Kerberos service name announced by the brokers.
    pub service_name: String,
    /// Broker security protocol, e.g. `SASL_PLAINTEXT` or `PLAINTEXT`.
    pub security_protocol: String,
    /// Pre-existing JAAS configuration file, if any. When unset, one is
    /// generated during credential setup.
    pub jaas_config_path: Option<PathBuf>,
    /// Consumer group id.
    pub consumer_group_id: String,
    /// Offset reset policy for new consumer groups.
    pub auto_offset_reset: String,
    /// Upper bound on records accumulated per consume call.
    pub max_poll_records: usize,
    /// Consumer session timeout in milliseconds.
    pub session_timeout_ms: u64,
    /// Consumer heartbeat interval in milliseconds.
    pub heartbeat_interval_ms: u64,
}

impl ResolvedSettings {
    /// Merges settings from an optional config file and the given
    /// environment mapping, applying defaults for anything still absent.
    ///
    /// Precedence is strict: environment > file > default. A required key
    /// absent from both sources stays empty and is caught by
    /// [`validate`](Self::validate).
    pub fn resolve(
        file: Option<&Path>,
        environment: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut working: HashMap<String, String> = HashMap::new();

        if let Some(path) = file {
            if path.exists() {
                seed_from_file(path, &mut working)?;
            }
        }

        for key in RECOGNIZED_KEYS {
            let env_name = format!("{ENV_PREFIX}{}", key.to_uppercase());
            if let Some(value) = environment.get(&env_name) {
                working.insert(key.to_string(), value.clone());
            }
        }

        for (key, default) in DEFAULTS {
            working
                .entry(key.to_string())
                .or_insert_with(|| default.to_string());
        }

        let max_poll_records = coerce_numeric(&working, "max_poll_records")?;
        let session_timeout_ms = coerce_numeric(&working, "session_timeout_ms")?;
        let heartbeat_interval_ms = coerce_numeric(&working, "heartbeat_interval_ms")?;

        let jaas_config_path = working
            .remove("jaas_config_path")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let mut take = |key: &str| working.remove(key).unwrap_or_default();

        Ok(ResolvedSettings {
            bootstrap_servers: take("bootstrap_servers"),
            topic: take("topic"),
            keytab_path: take("keytab_path"),
            principal: take("principal"),
            service_name: take("service_name"),
            security_protocol: take("security_protocol"),
            jaas_config_path,
            consumer_group_id: take("consumer_group_id"),
            auto_offset_reset: take("auto_offset_reset"),
            max_poll_records,
            session_timeout_ms,
            heartbeat_interval_ms,
        })
    }

    /// Resolves settings from the process environment.
    pub fn from_process_env(file: Option<&Path>) -> Result<Self, ConfigError> {
        let environment: HashMap<String, String> = env::vars().collect();
        Self::resolve(file, &environment)
    }

    /// Validates the merged record against required-field and filesystem
    /// rules. Runs once, before any client handle is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("bootstrap_servers", &self.bootstrap_servers),
            ("topic", &self.topic),
            ("keytab_path", &self.keytab_path),
            ("principal", &self.principal),
        ];

        let fields: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect();

        if !fields.is_empty() {
            return Err(ConfigError::MissingRequired { fields });
        }

        let keytab = Path::new(&self.keytab_path);
        if !keytab.exists() {
            return Err(ConfigError::KeytabNotFound {
                path: keytab.to_path_buf(),
            });
        }

        if self.broker_list().is_empty() {
            return Err(ConfigError::EmptyBrokerList);
        }

        info!(
            brokers = %self.bootstrap_servers,
            topic = %self.topic,
            principal = %self.principal,
            "configuration validated"
        );
        Ok(())
    }

    /// Broker addresses, split on commas with empty entries dropped.
    pub fn broker_list(&self) -> Vec<&str> {
        self.bootstrap_servers
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect()
    }

    /// Whether the configured protocol requires SASL authentication.
    pub fn uses_sasl(&self) -> bool {
        self.security_protocol.to_uppercase().starts_with("SASL")
    }
}

impl KafkaProducerConfig for ResolvedSettings {
    fn kafka_bootstrap(&self) -> &str {
        &self.bootstrap_servers
    }

    fn security_protocol(&self) -> &str {
        &self.security_protocol
    }

    fn kerberos_service_name(&self) -> &str {
        &self.service_name
    }

    fn kerberos_keytab(&self) -> Option<&str> {
        self.uses_sasl().then_some(self.keytab_path.as_str())
    }

    fn kerberos_principal(&self) -> Option<&str> {
        self.uses_sasl().then_some(self.principal.as_str())
    }
}

impl KafkaConsumerConfig for ResolvedSettings {
    fn kafka_bootstrap(&self) -> &str {
        &self.bootstrap_servers
    }

    fn consumer_group(&self) -> &str {
        &self.consumer_group_id
    }

    fn kafka_topic(&self) -> &str {
        &self.topic
    }

    fn auto_offset_reset(&self) -> &str {
        &self.auto_offset_reset
    }

    fn session_timeout_ms(&self) -> u64 {
        self.session_timeout_ms
    }

    fn heartbeat_interval_ms(&self) -> u64 {
        self.heartbeat_interval_ms
    }

    fn security_protocol(&self) -> &str {
        &self.security_protocol
    }

    fn kerberos_service_name(&self) -> &str {
        &self.service_name
    }

    fn kerberos_keytab(&self) -> Option<&str> {
        self.uses_sasl().then_some(self.keytab_path.as_str())
    }

    fn kerberos_principal(&self) -> Option<&str> {
        self.uses_sasl().then_some(self.principal.as_str())
    }
}

/// Seeds the working map from the `[kafka]` table of a TOML file.
///
/// Scalar values are stringified so the overlay and coercion steps treat
/// file-sourced and environment-sourced values uniformly.
fn seed_from_file(path: &Path, working: &mut HashMap<String, String>) -> Result<(), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|err| ConfigError::FileInvalid {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    let parsed: toml::Value = toml::from_str(&content).map_err(|err| ConfigError::FileInvalid {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    let Some(section) = parsed.get(CONFIG_SECTION).and_then(|v| v.as_table()) else {
        debug!(path = %path.display(), "config file has no [kafka] section");
        return Ok(());
    };

    for key in RECOGNIZED_KEYS {
        let Some(value) = section.get(key) else {
            continue;
        };
        let text = match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            other => {
                debug!(key, kind = other.type_str(), "ignoring non-scalar config value");
                continue;
            }
        };
        working.insert(key.to_string(), text);
    }

    info!(path = %path.display(), "seeded settings from config file");
    Ok(())
}

fn coerce_numeric<T>(working: &HashMap<String, String>, field: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
{
    let raw = working.get(field).map(String::as_str).unwrap_or_default();
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumeric {
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required_env(keytab: &Path) -> HashMap<String, String> {
        env_of(&[
            ("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
            ("KAFKA_TOPIC", "events"),
            ("KAFKA_KEYTAB_PATH", keytab.to_str().unwrap()),
            ("KAFKA_PRINCIPAL", "user@EXAMPLE.COM"),
        ])
    }

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_applied_when_absent() {
        let settings = ResolvedSettings::resolve(None, &HashMap::new()).unwrap();

        assert_eq!(settings.service_name, "kafka");
        assert_eq!(settings.security_protocol, "SASL_PLAINTEXT");
        assert_eq!(settings.consumer_group_id, "kafka-utility-group");
        assert_eq!(settings.auto_offset_reset, "earliest");
        assert_eq!(settings.max_poll_records, 500);
        assert_eq!(settings.session_timeout_ms, 30000);
        assert_eq!(settings.heartbeat_interval_ms, 3000);
        assert!(settings.jaas_config_path.is_none());
        assert!(settings.bootstrap_servers.is_empty());
    }

    #[test]
    fn environment_overrides_file() {
        let file = config_file(
            r#"
[kafka]
bootstrap_servers = "localhost:9092"
topic = "file-topic"
"#,
        );
        let environment = env_of(&[("KAFKA_BOOTSTRAP_SERVERS", "broker1:9092,broker2:9092")]);

        let settings = ResolvedSettings::resolve(Some(file.path()), &environment).unwrap();

        assert_eq!(settings.bootstrap_servers, "broker1:9092,broker2:9092");
        // File value survives where the environment is silent.
        assert_eq!(settings.topic, "file-topic");
    }

    #[test]
    fn file_integers_are_coerced() {
        let file = config_file(
            r#"
[kafka]
session_timeout_ms = 45000
max_poll_records = 100
"#,
        );

        let settings = ResolvedSettings::resolve(Some(file.path()), &HashMap::new()).unwrap();

        assert_eq!(settings.session_timeout_ms, 45000);
        assert_eq!(settings.max_poll_records, 100);
    }

    #[test]
    fn missing_file_is_ignored() {
        let settings =
            ResolvedSettings::resolve(Some(Path::new("/nonexistent/kafka.toml")), &HashMap::new())
                .unwrap();
        assert_eq!(settings.service_name, "kafka");
    }

    #[test]
    fn malformed_file_is_rejected() {
        let file = config_file("[kafka\nbroken");
        let err = ResolvedSettings::resolve(Some(file.path()), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::FileInvalid { .. }));
    }

    #[test]
    fn invalid_numeric_is_rejected() {
        let environment = env_of(&[("KAFKA_MAX_POLL_RECORDS", "lots")]);
        let err = ResolvedSettings::resolve(None, &environment).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumeric {
                field: "max_poll_records",
                ..
            }
        ));
    }

    #[test]
    fn validate_reports_all_missing_fields() {
        let settings = ResolvedSettings::resolve(None, &HashMap::new()).unwrap();
        let err = settings.validate().unwrap_err();

        match err {
            ConfigError::MissingRequired { fields } => {
                assert_eq!(
                    fields,
                    vec!["bootstrap_servers", "topic", "keytab_path", "principal"]
                );
            }
            other => panic!("expected MissingRequired, got {other:?}"),
        }
    }

    #[test]
    fn validate_reports_partial_missing_subset() {
        let environment = env_of(&[
            ("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
            ("KAFKA_PRINCIPAL", "user@EXAMPLE.COM"),
        ]);
        let settings = ResolvedSettings::resolve(None, &environment).unwrap();
        let err = settings.validate().unwrap_err();

        match err {
            ConfigError::MissingRequired { fields } => {
                assert_eq!(fields, vec!["topic", "keytab_path"]);
            }
            other => panic!("expected MissingRequired, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_missing_keytab_file() {
        let environment = env_of(&[
            ("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
            ("KAFKA_TOPIC", "events"),
            ("KAFKA_KEYTAB_PATH", "/nonexistent/service.keytab"),
            ("KAFKA_PRINCIPAL", "user@EXAMPLE.COM"),
        ]);
        let settings = ResolvedSettings::resolve(None, &environment).unwrap();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::KeytabNotFound { .. }));
    }

    #[test]
    fn validate_accepts_existing_keytab() {
        let keytab = NamedTempFile::new().unwrap();
        let settings = ResolvedSettings::resolve(None, &required_env(keytab.path())).unwrap();
        settings.validate().unwrap();
    }

    #[test]
    fn validate_rejects_blank_broker_entries() {
        let keytab = NamedTempFile::new().unwrap();
        let mut environment = required_env(keytab.path());
        environment.insert("KAFKA_BOOTSTRAP_SERVERS".to_string(), " , ".to_string());

        let settings = ResolvedSettings::resolve(None, &environment).unwrap();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyBrokerList));
    }

    #[test]
    fn broker_list_splits_and_trims() {
        let environment = env_of(&[(
            "KAFKA_BOOTSTRAP_SERVERS",
            "broker1:9092, broker2:9092 ,,broker3:9092",
        )]);
        let settings = ResolvedSettings::resolve(None, &environment).unwrap();
        assert_eq!(
            settings.broker_list(),
            vec!["broker1:9092", "broker2:9092", "broker3:9092"]
        );
    }
}
