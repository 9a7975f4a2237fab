//! OCI Object Storage client
//!
//! Translates object operations into signed requests:
//! - Argument validation before any network I/O
//! - One date stamp and descriptor per call
//! - Signing through the client's `RequestSigner`
//! - Execution through a pluggable `HttpExecutor`
//!
//! The client holds only read-only state and can be cloned and shared
//! across tasks.

use bytes::Bytes;
use chrono::Utc;
use hyper::Method;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{BackendConfig, RedactedConfig};
use crate::error::{OciError, Result};
use crate::oci::content_type::content_type_for;
use crate::oci::request::{http_date, RequestDescriptor};
use crate::oci::signer::RequestSigner;
use crate::oci::types::ConnectionStatus;
use crate::transport::{HttpExecutor, HyperExecutor, RequestOutcome};

/// Page size the service uses when `limit` is not sent
pub const DEFAULT_LIST_LIMIT: u32 = 1000;

/// Summary fields for a detailed listing; without `fields` only `name` is returned
pub const LISTING_FIELDS: [&str; 3] = ["name", "size", "timeCreated"];

/// Object Storage client bound to one bucket
#[derive(Clone)]
pub struct ObjectStorageClient {
    config: Arc<BackendConfig>,
    signer: Arc<RequestSigner>,
    executor: Arc<dyn HttpExecutor>,
    host: String,
}

impl std::fmt::Debug for ObjectStorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorageClient")
            .field("host", &self.host)
            .field("namespace", &self.config.namespace)
            .field("bucket", &self.config.bucket_name)
            .finish_non_exhaustive()
    }
}

impl ObjectStorageClient {
    /// Create a client with the default hyper executor.
    ///
    /// Fails if the configuration is incomplete or the key cannot be loaded;
    /// no client is returned in that case.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let signer = Self::load_signer(&config)?;
        let executor = HyperExecutor::new(config.http.clone())?;
        Ok(Self::assemble(config, signer, Arc::new(executor)))
    }

    /// Create a client that sends through the given executor
    pub fn with_executor(config: BackendConfig, executor: Arc<dyn HttpExecutor>) -> Result<Self> {
        let signer = Self::load_signer(&config)?;
        Ok(Self::assemble(config, signer, executor))
    }

    /// Load configuration from the environment and create a client
    pub fn from_env() -> Result<Self> {
        Self::new(BackendConfig::from_env()?)
    }

    fn load_signer(config: &BackendConfig) -> Result<RequestSigner> {
        config.validate()?;
        let pem = config.load_private_key_pem()?;
        RequestSigner::from_pem(config.key_id(), &pem)
    }

    fn assemble(
        config: BackendConfig,
        signer: RequestSigner,
        executor: Arc<dyn HttpExecutor>,
    ) -> Self {
        let host = config.host();
        debug!(
            host = %host,
            namespace = %config.namespace,
            bucket = %config.bucket_name,
            "object storage client ready"
        );
        Self {
            config: Arc::new(config),
            signer: Arc::new(signer),
            executor,
            host,
        }
    }

    /// Configuration without key location or key material
    pub fn config(&self) -> RedactedConfig {
        self.config.redacted()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `/n/{namespace}/b/{bucket}/o`
    pub fn bucket_path(&self) -> String {
        let mut path = String::with_capacity(
            8 + self.config.namespace.len() + self.config.bucket_name.len(),
        );
        path.push_str("/n/");
        path.push_str(&self.config.namespace);
        path.push_str("/b/");
        path.push_str(&self.config.bucket_name);
        path.push_str("/o");
        path
    }

    /// `/n/{namespace}/b/{bucket}/o/{percent-encoded name}`
    pub fn object_path(&self, object_name: &str) -> String {
        let mut path = self.bucket_path();
        path.push('/');
        path.push_str(&urlencoding::encode(object_name));
        path
    }

    /// Request target for a list call; parameters are sent only when they
    /// differ from the service defaults
    pub fn list_target(
        &self,
        prefix: &str,
        limit: u32,
        start: Option<&str>,
        fields: &[&str],
    ) -> String {
        let mut params: Vec<String> = Vec::with_capacity(4);
        if !prefix.is_empty() {
            params.push(format!("prefix={}", urlencoding::encode(prefix)));
        }
        if limit != 0 && limit != DEFAULT_LIST_LIMIT {
            params.push(format!("limit={}", limit));
        }
        if let Some(start) = start.filter(|s| !s.is_empty()) {
            params.push(format!("start={}", urlencoding::encode(start)));
        }
        if !fields.is_empty() {
            let fields: Vec<_> = fields.iter().map(|f| urlencoding::encode(f)).collect();
            params.push(format!("fields={}", fields.join(",")));
        }

        let mut target = self.bucket_path();
        if !params.is_empty() {
            target.push('?');
            target.push_str(&params.join("&"));
        }
        target
    }

    fn descriptor(&self, method: Method, request_target: String) -> RequestDescriptor {
        RequestDescriptor::new(method, self.host.clone(), request_target, http_date(Utc::now()))
    }

    async fn send(&self, descriptor: RequestDescriptor) -> Result<RequestOutcome> {
        debug!(
            method = %descriptor.method(),
            target = %descriptor.request_target(),
            signed_headers = %descriptor.signed_header_names().join(" "),
            "sending signed request"
        );
        let request = descriptor.sign(&self.signer)?;
        self.executor.execute(request).await
    }

    fn require_object_name(object_name: &str) -> Result<()> {
        if object_name.is_empty() {
            return Err(OciError::Validation("Object name cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Upload `content` as `object_name`.
    ///
    /// The content type is derived from the name's extension; the body digest
    /// and length are signed along with the request.
    pub async fn put(&self, content: impl Into<Bytes>, object_name: &str) -> Result<RequestOutcome> {
        let content = content.into();
        if content.is_empty() {
            return Err(OciError::Validation("Content cannot be empty".to_string()));
        }
        Self::require_object_name(object_name)?;

        let descriptor = self
            .descriptor(Method::PUT, self.object_path(object_name))
            .with_body(content, content_type_for(object_name));
        self.send(descriptor).await
    }

    /// Upload a local file; the object name defaults to the file's base name
    pub async fn put_file(
        &self,
        path: impl AsRef<Path>,
        object_name: Option<&str>,
    ) -> Result<RequestOutcome> {
        let path = path.as_ref();

        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(OciError::Validation(format!(
                    "Not a regular file: {}",
                    path.display()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OciError::Validation(format!(
                    "File not found: {}",
                    path.display()
                )))
            }
            Err(e) => return Err(OciError::Io(e)),
        }

        let object_name = match object_name.filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_string())
                .ok_or_else(|| {
                    OciError::Validation(format!(
                        "Cannot derive object name from {}",
                        path.display()
                    ))
                })?,
        };

        let content = tokio::fs::read(path).await?;
        self.put(content, &object_name).await
    }

    /// Download an object; the bytes are in the outcome body
    pub async fn get(&self, object_name: &str) -> Result<RequestOutcome> {
        Self::require_object_name(object_name)?;
        let descriptor = self.descriptor(Method::GET, self.object_path(object_name));
        self.send(descriptor).await
    }

    pub async fn delete(&self, object_name: &str) -> Result<RequestOutcome> {
        Self::require_object_name(object_name)?;
        let descriptor = self.descriptor(Method::DELETE, self.object_path(object_name));
        self.send(descriptor).await
    }

    /// List objects under `prefix`, at most `limit` per page
    pub async fn list(&self, prefix: &str, limit: u32) -> Result<RequestOutcome> {
        self.list_page(prefix, limit, None, &[]).await
    }

    /// List one page starting at `start` (the previous page's `nextStartWith`).
    ///
    /// `fields` selects the summary fields returned per object, e.g.
    /// [`LISTING_FIELDS`]; empty leaves the service default of `name` only.
    pub async fn list_page(
        &self,
        prefix: &str,
        limit: u32,
        start: Option<&str>,
        fields: &[&str],
    ) -> Result<RequestOutcome> {
        let target = self.list_target(prefix, limit, start, fields);
        let descriptor = self.descriptor(Method::GET, target);
        self.send(descriptor).await
    }

    /// Probe the bucket with a one-item list.
    ///
    /// Errors are reported in the returned status rather than propagated.
    pub async fn test_connection(&self) -> ConnectionStatus {
        match self.list("", 1).await {
            Ok(outcome) => ConnectionStatus::Responded {
                reachable: outcome.success(),
                details: Box::new(outcome),
            },
            Err(e) => {
                warn!(error = %e, "connection test failed");
                ConnectionStatus::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }
}
