//! Kerberos (GSSAPI) credential setup.
//!
//! Prepares process-wide authentication state: the Kerberos environment
//! variables and a JAAS login-module configuration file embedding the
//! keytab and principal. The shared file path and environment variables
//! are initialized once per session and never reset before process exit.
//!
//! # Known limitation
//!
//! Concurrent sessions in one process race on the generated JAAS file and
//! the environment variables. The assumed deployment model is one session
//! per process; callers needing isolation must run separate processes.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ResolvedSettings;
use crate::error::CredentialError;

/// Kerberos configuration read by the GSSAPI library.
const KRB5_CONFIG_PATH: &str = "/etc/krb5.conf";

/// File name of the generated JAAS configuration.
const JAAS_FILE_NAME: &str = "kafka_jaas.conf";

/// Well-known path the JAAS configuration is generated at.
pub fn default_jaas_path() -> PathBuf {
    env::temp_dir().join(JAAS_FILE_NAME)
}

/// Sets up the Kerberos authentication environment for this process and
/// returns the JAAS configuration path in effect.
///
/// A pre-configured `jaas_config_path` is used unchanged, whether or not
/// the file exists yet (it may be provisioned out-of-band); otherwise a
/// JAAS file is synthesized at [`default_jaas_path`].
pub fn setup_credentials(settings: &ResolvedSettings) -> Result<PathBuf, CredentialError> {
    env::set_var("KRB5_CONFIG", KRB5_CONFIG_PATH);
    env::set_var("KRB5CCNAME", credential_cache_location());

    let jaas_path = match &settings.jaas_config_path {
        Some(path) => {
            info!(path = %path.display(), "using pre-configured JAAS configuration");
            path.clone()
        }
        None => {
            let path = default_jaas_path();
            write_jaas_config(&path, &settings.keytab_path, &settings.principal)?;
            info!(path = %path.display(), "created JAAS configuration");
            path
        }
    };

    env::set_var(
        "JAVA_OPTS",
        format!(
            "-Djava.security.auth.login.config={}",
            jaas_path.display()
        ),
    );

    info!("Kerberos authentication environment configured successfully");
    Ok(jaas_path)
}

/// Per-process Kerberos credential cache location.
fn credential_cache_location() -> String {
    let cache = env::temp_dir().join(format!("krb5cc_kafka_{}", std::process::id()));
    format!("FILE:{}", cache.display())
}

/// Renders the `KafkaClient` login-module stanza for the given identity.
fn render_jaas_config(keytab_path: &str, principal: &str) -> String {
    format!(
        r#"KafkaClient {{
    com.sun.security.auth.module.Krb5LoginModule required
    useKeyTab=true
    storeKey=true
    keyTab="{keytab_path}"
    principal="{principal}";
}};
"#
    )
}

fn write_jaas_config(path: &Path, keytab: &str, principal: &str) -> Result<(), CredentialError> {
    fs::write(path, render_jaas_config(keytab, principal)).map_err(|source| {
        CredentialError::WriteFailed {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with_jaas(jaas: Option<PathBuf>) -> ResolvedSettings {
        let mut settings = ResolvedSettings::resolve(None, &HashMap::new()).unwrap();
        settings.keytab_path = "/etc/security/service.keytab".to_string();
        settings.principal = "service@EXAMPLE.COM".to_string();
        settings.jaas_config_path = jaas;
        settings
    }

    #[test]
    fn renders_keytab_and_principal() {
        let rendered = render_jaas_config("/etc/security/service.keytab", "service@EXAMPLE.COM");

        assert!(rendered.starts_with("KafkaClient {"));
        assert!(rendered.contains("com.sun.security.auth.module.Krb5LoginModule required"));
        assert!(rendered.contains(r#"keyTab="/etc/security/service.keytab""#));
        assert!(rendered.contains(r#"principal="service@EXAMPLE.COM";"#));
    }

    #[test]
    fn writes_jaas_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kafka_jaas.conf");

        write_jaas_config(&path, "/tmp/test.keytab", "user@EXAMPLE.COM").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(r#"keyTab="/tmp/test.keytab""#));
    }

    #[test]
    fn write_failure_is_reported() {
        let err = write_jaas_config(
            Path::new("/nonexistent/dir/kafka_jaas.conf"),
            "/tmp/test.keytab",
            "user@EXAMPLE.COM",
        )
        .unwrap_err();
        assert!(matches!(err, CredentialError::WriteFailed { .. }));
    }

    #[test]
    fn preconfigured_jaas_path_is_reused() {
        let jaas = tempfile::NamedTempFile::new().unwrap();
        let settings = settings_with_jaas(Some(jaas.path().to_path_buf()));

        let path = setup_credentials(&settings).unwrap();
        assert_eq!(path, jaas.path());
    }

    #[test]
    fn preconfigured_jaas_path_is_used_even_when_absent() {
        // The file may be provisioned after startup; the configured path
        // is exported as-is, with no existence check.
        let settings = settings_with_jaas(Some(PathBuf::from("/nonexistent/jaas.conf")));
        let path = setup_credentials(&settings).unwrap();
        assert_eq!(path, PathBuf::from("/nonexistent/jaas.conf"));
    }
}
