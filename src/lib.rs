//! ocistore - async OCI Object Storage client with request signing

pub mod cli;
pub mod config;
pub mod error;
pub mod oci;
pub mod transport;

pub use config::{BackendConfig, HttpSettings, RedactedConfig};
pub use error::{OciError, Result};
pub use oci::{ConnectionStatus, ObjectStorageClient, RequestSigner};
pub use transport::{HttpExecutor, HttpRequest, RequestOutcome};
