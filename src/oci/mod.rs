//! OCI Object Storage client with HTTP-signature authentication
//!
//! This module provides:
//! - RSA-SHA256 request signing (`Signature version="1"` scheme)
//! - Request descriptors with body digest headers
//! - Async object operations (put, get, delete, list, connection probe)
//! - Typed views of list responses

pub mod client;
pub mod content_type;
pub mod request;
pub mod signer;
pub mod types;

// Re-export main types for convenience
pub use client::{ObjectStorageClient, DEFAULT_LIST_LIMIT, LISTING_FIELDS};
pub use content_type::{content_type_for, DEFAULT_CONTENT_TYPE};
pub use request::{content_sha256, http_date, RequestDescriptor};
pub use signer::RequestSigner;
pub use types::{ConnectionStatus, ListObjectsResponse, ObjectSummary};

pub use crate::transport::RequestOutcome;
