//! Normalized result of one executed HTTP call

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

/// Whether a status code counts as success (`200..300`)
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Transport-level facts about a completed exchange
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferMetadata {
    /// URL of the final hop, after redirects
    pub effective_url: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    /// `opc-request-id`, the id to quote when contacting support
    pub request_id: Option<String>,
    pub etag: Option<String>,
    pub redirect_count: u32,
    /// Wall time for the whole exchange, redirects and body included
    pub total_time_ms: u64,
}

/// Outcome of an executed request.
///
/// Built once by the executor and never modified; a non-2xx status is a
/// normal outcome with `success() == false`, not an error.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    success: bool,
    status: u16,
    body: Option<Bytes>,
    metadata: TransferMetadata,
    data: Option<Value>,
}

impl RequestOutcome {
    /// Classify the status and decode a JSON body when the content type says so.
    ///
    /// A body that fails to parse as JSON simply leaves `data` empty.
    pub fn new(status: u16, body: Bytes, metadata: TransferMetadata) -> Self {
        let body = if body.is_empty() { None } else { Some(body) };

        let is_json = metadata
            .content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);

        let data = match (&body, is_json) {
            (Some(bytes), true) => serde_json::from_slice::<Value>(bytes).ok(),
            _ => None,
        };

        Self {
            success: is_success_status(status),
            status,
            body,
            metadata,
            data,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Body decoded as UTF-8, lossy
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn metadata(&self) -> &TransferMetadata {
        &self.metadata
    }

    /// Parsed JSON body, present only for JSON responses that parsed cleanly
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// First `max_chars` characters of the body, for log lines
    pub fn body_snippet(&self, max_chars: usize) -> String {
        match &self.body {
            Some(bytes) => String::from_utf8_lossy(bytes).chars().take(max_chars).collect(),
            None => String::new(),
        }
    }
}
