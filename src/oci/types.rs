//! OCI Object Storage types and response structures

use serde::{Deserialize, Serialize};

use crate::transport::RequestOutcome;

/// One entry of a ListObjects response
///
/// The service returns only `name` unless more fields are requested with
/// `fields=` (see `LISTING_FIELDS`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub time_created: Option<String>,
    #[serde(default)]
    pub time_modified: Option<String>,
    #[serde(default)]
    pub storage_tier: Option<String>,
}

/// Body of a ListObjects response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsResponse {
    #[serde(default)]
    pub objects: Vec<ObjectSummary>,
    /// Common prefixes when a delimiter was used
    #[serde(default)]
    pub prefixes: Vec<String>,
    /// Name to start the next page at, absent on the last page
    #[serde(default)]
    pub next_start_with: Option<String>,
}

impl ListObjectsResponse {
    /// Decode the parsed JSON body of a successful list call
    pub fn from_outcome(outcome: &RequestOutcome) -> Option<Self> {
        if !outcome.success() {
            return None;
        }
        outcome
            .data()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Result of the connection probe; never an error
#[derive(Debug, Clone)]
pub enum ConnectionStatus {
    /// The service answered; `reachable` mirrors the outcome's success flag
    Responded {
        reachable: bool,
        details: Box<RequestOutcome>,
    },
    /// The probe could not complete
    Degraded { reason: String },
}

impl ConnectionStatus {
    pub fn success(&self) -> bool {
        matches!(self, ConnectionStatus::Responded { reachable: true, .. })
    }

    pub fn message(&self) -> String {
        match self {
            ConnectionStatus::Responded { reachable: true, .. } => "Connection successful".to_string(),
            ConnectionStatus::Responded { reachable: false, .. } => "Connection failed".to_string(),
            ConnectionStatus::Degraded { reason } => format!("Connection test failed: {}", reason),
        }
    }

    pub fn details(&self) -> Option<&RequestOutcome> {
        match self {
            ConnectionStatus::Responded { details, .. } => Some(details.as_ref()),
            ConnectionStatus::Degraded { .. } => None,
        }
    }
}
