use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{OciError, Result};
use crate::oci::signer::RequestSigner;

/// Required variables, in the order they are checked
pub const REQUIRED_ENV_VARS: [&str; 7] = [
    "OCI_REGION",
    "OCI_USER",
    "OCI_FINGERPRINT",
    "OCI_TENANCY",
    "OCI_NAMESPACE",
    "OCI_KEY_FILE",
    "OCI_BUCKET_NAME",
];

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Total request timeout in seconds, redirects and body included
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Verify server certificates (disable only for test endpoints)
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Redirects followed before giving up
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_verify_tls() -> bool {
    true
}

fn default_max_redirects() -> u32 {
    10
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            verify_tls: default_verify_tls(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// OCI Object Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Region identifier, e.g. `us-ashburn-1`
    pub region: String,

    /// User OCID
    pub user_id: String,

    /// Tenancy OCID
    pub tenancy_id: String,

    /// Fingerprint of the uploaded API public key
    pub key_fingerprint: String,

    /// Object Storage namespace
    pub namespace: String,

    pub bucket_name: String,

    /// PEM private key location, absolute or relative to `base_dir`
    pub key_file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buckets_ocid: Option<String>,

    /// Directory relative key paths resolve against (default: working directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    #[serde(default)]
    pub http: HttpSettings,
}

/// Configuration view safe to print: no key location, no key material
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactedConfig {
    pub region: String,
    pub user_id: String,
    pub tenancy_id: String,
    pub key_fingerprint: String,
    pub namespace: String,
    pub bucket_name: String,
    pub buckets_ocid: Option<String>,
}

impl BackendConfig {
    /// Build a configuration from any name→value source.
    ///
    /// Required variables are checked in [`REQUIRED_ENV_VARS`] order and the
    /// first missing or empty one is reported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let region = required(&lookup, "OCI_REGION")?;
        let user_id = required(&lookup, "OCI_USER")?;
        let key_fingerprint = required(&lookup, "OCI_FINGERPRINT")?;
        let tenancy_id = required(&lookup, "OCI_TENANCY")?;
        let namespace = required(&lookup, "OCI_NAMESPACE")?;
        let key_file = required(&lookup, "OCI_KEY_FILE")?;
        let bucket_name = required(&lookup, "OCI_BUCKET_NAME")?;

        let buckets_ocid = lookup("OCI_BUCKETS_OCID").filter(|v| !v.is_empty());
        let base_dir = lookup("OCI_BASE_PATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let mut http = HttpSettings::default();
        if let Some(val) = lookup("OCI_HTTP_TIMEOUT").and_then(|v| v.parse().ok()) {
            http.timeout_secs = val;
        }
        if let Some(val) = lookup("OCI_CONNECT_TIMEOUT").and_then(|v| v.parse().ok()) {
            http.connect_timeout_secs = val;
        }
        if let Some(val) = lookup("OCI_MAX_REDIRECTS").and_then(|v| v.parse().ok()) {
            http.max_redirects = val;
        }
        if let Some(insecure) = lookup("OCI_INSECURE_TLS") {
            http.verify_tls = !(insecure == "true" || insecure == "1");
        }

        Ok(Self {
            region,
            user_id,
            tenancy_id,
            key_fingerprint,
            namespace,
            bucket_name,
            key_file,
            buckets_ocid,
            base_dir,
            http,
        })
    }

    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        // Don't fail if there is no .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Check that every required field is non-empty
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("OCI_REGION", &self.region),
            ("OCI_USER", &self.user_id),
            ("OCI_FINGERPRINT", &self.key_fingerprint),
            ("OCI_TENANCY", &self.tenancy_id),
            ("OCI_NAMESPACE", &self.namespace),
            ("OCI_KEY_FILE", &self.key_file),
            ("OCI_BUCKET_NAME", &self.bucket_name),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(OciError::Config(format!("{} is empty", name)));
            }
        }

        if self.http.timeout_secs == 0 {
            return Err(OciError::Config("HTTP timeout must be positive".to_string()));
        }
        if self.http.connect_timeout_secs == 0 {
            return Err(OciError::Config("HTTP connect timeout must be positive".to_string()));
        }

        Ok(())
    }

    /// `<tenancy>/<user>/<fingerprint>`
    pub fn key_id(&self) -> String {
        RequestSigner::key_id_for(&self.tenancy_id, &self.user_id, &self.key_fingerprint)
    }

    /// Object Storage host for the configured region
    pub fn host(&self) -> String {
        format!("objectstorage.{}.oraclecloud.com", self.region)
    }

    /// Absolute location of the private key file
    pub fn resolve_key_path(&self) -> PathBuf {
        if is_absolute_key_path(&self.key_file) {
            return PathBuf::from(&self.key_file);
        }

        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        base.join(&self.key_file)
    }

    /// Read the private key PEM and check it looks like one
    pub fn load_private_key_pem(&self) -> Result<String> {
        let path = self.resolve_key_path();

        if !path.exists() {
            return Err(OciError::KeyLoad(format!(
                "Private key file not found: {}",
                path.display()
            )));
        }

        let pem = load_key_material(&path).map_err(|e| {
            OciError::KeyLoad(format!(
                "Private key file is not readable: {}: {}",
                path.display(),
                e
            ))
        })?;

        if !pem.contains("-----BEGIN") {
            return Err(OciError::KeyLoad(format!(
                "Invalid private key file format: {}",
                path.display()
            )));
        }

        Ok(pem)
    }

    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            region: self.region.clone(),
            user_id: self.user_id.clone(),
            tenancy_id: self.tenancy_id.clone(),
            key_fingerprint: self.key_fingerprint.clone(),
            namespace: self.namespace.clone(),
            bucket_name: self.bucket_name.clone(),
            buckets_ocid: self.buckets_ocid.clone(),
        }
    }
}

fn required<F>(lookup: &F, var: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(var)
        .ok_or_else(|| OciError::Config(format!("Environment variable {} is not set", var)))?;
    if value.trim().is_empty() {
        return Err(OciError::Config(format!("Environment variable {} is empty", var)));
    }
    Ok(value)
}

/// Absolute POSIX path or Windows drive path (`C:\...`)
fn is_absolute_key_path(key_file: &str) -> bool {
    key_file.starts_with('/') || key_file.contains(":\\") || Path::new(key_file).is_absolute()
}

/// Read PEM key material from disk
pub fn load_key_material(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<BackendConfig> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        OciError::Config(format!(
            "Failed to read config file: {:?}: {}",
            path.as_ref(),
            e
        ))
    })?;

    let config: BackendConfig = serde_yaml::from_str(&content)
        .map_err(|e| OciError::Config(format!("Failed to parse YAML configuration: {}", e)))?;

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// - OCI_REGION, OCI_USER, OCI_FINGERPRINT, OCI_TENANCY, OCI_NAMESPACE,
///   OCI_KEY_FILE, OCI_BUCKET_NAME (required)
/// - OCI_BUCKETS_OCID, OCI_BASE_PATH (optional)
/// - OCI_HTTP_TIMEOUT, OCI_CONNECT_TIMEOUT, OCI_MAX_REDIRECTS, OCI_INSECURE_TLS (optional)
pub fn load_from_env() -> Result<BackendConfig> {
    BackendConfig::from_env()
}

/// Load configuration from a YAML file when given, otherwise from the environment
pub fn load_config(config_path: Option<&str>) -> Result<BackendConfig> {
    match config_path {
        Some(path) => load_from_yaml(path),
        None => load_from_env(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        let mut env = HashMap::new();
        env.insert("OCI_REGION", "us-ashburn-1".to_string());
        env.insert("OCI_USER", "ocid1.user.oc1..aaa".to_string());
        env.insert("OCI_FINGERPRINT", "12:34:56".to_string());
        env.insert("OCI_TENANCY", "ocid1.tenancy.oc1..bbb".to_string());
        env.insert("OCI_NAMESPACE", "ns1".to_string());
        env.insert("OCI_KEY_FILE", "keys/oci.pem".to_string());
        env.insert("OCI_BUCKET_NAME", "b1".to_string());
        env
    }

    fn from_map(env: &HashMap<&'static str, String>) -> Result<BackendConfig> {
        BackendConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn test_from_lookup() {
        let config = from_map(&full_env()).unwrap();

        assert_eq!(config.region, "us-ashburn-1");
        assert_eq!(config.namespace, "ns1");
        assert_eq!(config.bucket_name, "b1");
        assert_eq!(config.key_fingerprint, "12:34:56");
        assert_eq!(config.buckets_ocid, None);
        assert_eq!(
            config.key_id(),
            "ocid1.tenancy.oc1..bbb/ocid1.user.oc1..aaa/12:34:56"
        );
        assert_eq!(config.host(), "objectstorage.us-ashburn-1.oraclecloud.com");

        // Default HTTP settings
        assert_eq!(config.http.timeout_secs, 300);
        assert_eq!(config.http.connect_timeout_secs, 30);
        assert!(config.http.verify_tls);
    }

    #[test]
    fn test_missing_namespace() {
        let mut env = full_env();
        env.remove("OCI_NAMESPACE");

        let err = from_map(&env).unwrap_err();
        match err {
            OciError::Config(msg) => assert!(msg.contains("OCI_NAMESPACE")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_every_required_variable_is_checked() {
        for var in REQUIRED_ENV_VARS {
            let mut env = full_env();
            env.remove(var);
            let err = from_map(&env).unwrap_err();
            assert!(err.to_string().contains(var), "{} not reported", var);
        }
    }

    #[test]
    fn test_first_missing_variable_is_reported() {
        let mut env = full_env();
        env.remove("OCI_BUCKET_NAME");
        env.remove("OCI_REGION");

        let err = from_map(&env).unwrap_err();
        assert!(err.to_string().contains("OCI_REGION"));
    }

    #[test]
    fn test_empty_variable_rejected() {
        let mut env = full_env();
        env.insert("OCI_TENANCY", "  ".to_string());

        let err = from_map(&env).unwrap_err();
        assert!(matches!(err, OciError::Config(ref m) if m.contains("OCI_TENANCY")));
    }

    #[test]
    fn test_optional_and_http_overrides() {
        let mut env = full_env();
        env.insert("OCI_BUCKETS_OCID", "ocid1.bucket.oc1..ccc".to_string());
        env.insert("OCI_BASE_PATH", "/srv/app".to_string());
        env.insert("OCI_HTTP_TIMEOUT", "60".to_string());
        env.insert("OCI_CONNECT_TIMEOUT", "5".to_string());
        env.insert("OCI_INSECURE_TLS", "1".to_string());
        env.insert("OCI_MAX_REDIRECTS", "not-a-number".to_string());

        let config = from_map(&env).unwrap();
        assert_eq!(config.buckets_ocid.as_deref(), Some("ocid1.bucket.oc1..ccc"));
        assert_eq!(config.http.timeout(), Duration::from_secs(60));
        assert_eq!(config.http.connect_timeout(), Duration::from_secs(5));
        assert!(!config.http.verify_tls);
        // Unparseable values keep the default
        assert_eq!(config.http.max_redirects, 10);
        assert_eq!(
            config.resolve_key_path(),
            PathBuf::from("/srv/app").join("keys/oci.pem")
        );
    }

    #[test]
    fn test_key_path_resolution() {
        let mut config = from_map(&full_env()).unwrap();

        config.key_file = "/etc/oci/key.pem".to_string();
        assert_eq!(config.resolve_key_path(), PathBuf::from("/etc/oci/key.pem"));

        assert!(is_absolute_key_path("C:\\keys\\oci.pem"));
        assert!(!is_absolute_key_path("keys/oci.pem"));
    }

    #[test]
    fn test_load_from_yaml_str() {
        let yaml = r#"
region: eu-frankfurt-1
user_id: ocid1.user.oc1..aaa
tenancy_id: ocid1.tenancy.oc1..bbb
key_fingerprint: "aa:bb"
namespace: ns1
bucket_name: b1
key_file: /etc/oci/key.pem
http:
  timeout_secs: 120
"#;

        let config: BackendConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.region, "eu-frankfurt-1");
        assert_eq!(config.http.timeout_secs, 120);
        // Should use defaults for the rest
        assert_eq!(config.http.connect_timeout_secs, 30);
        assert_eq!(config.http.max_redirects, 10);
        assert!(config.http.verify_tls);
    }

    #[test]
    fn test_validate_rejects_empty_field() {
        let mut config = from_map(&full_env()).unwrap();
        config.bucket_name = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OCI_BUCKET_NAME"));
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = from_map(&full_env()).unwrap();
        config.http.connect_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, OciError::Config(ref m) if m.contains("connect timeout")));

        let mut config = from_map(&full_env()).unwrap();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_omits_key_file() {
        let config = from_map(&full_env()).unwrap();
        let redacted = config.redacted();
        let json = serde_json::to_string(&redacted).unwrap();

        assert_eq!(redacted.namespace, "ns1");
        assert!(!json.contains("keys/oci.pem"));
        assert!(!json.contains("key_file"));
    }
}
