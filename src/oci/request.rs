//! Per-call request descriptor
//!
//! A descriptor starts from the fields every signed request carries (method,
//! host, request target, date). Attaching a body adds exactly three more
//! signed headers: `content-length`, `content-type`, `x-content-sha256`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::Method;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::oci::signer::RequestSigner;
use crate::transport::HttpRequest;

/// Format a timestamp as an RFC 1123 HTTP date in GMT
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Base64 SHA-256 digest of a body, as sent in `x-content-sha256`
pub fn content_sha256(body: &[u8]) -> String {
    BASE64.encode(Sha256::digest(body))
}

/// One signed request, built per call and consumed by [`RequestDescriptor::sign`]
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    host: String,
    request_target: String,
    date: String,
    body: Option<Bytes>,
    /// Body headers, in signing order
    additional_headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(
        method: Method,
        host: impl Into<String>,
        request_target: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            method,
            host: host.into(),
            request_target: request_target.into(),
            date: date.into(),
            body: None,
            additional_headers: Vec::new(),
        }
    }

    /// Attach a body together with its length, type and digest headers
    pub fn with_body(mut self, body: Bytes, content_type: &str) -> Self {
        self.additional_headers = vec![
            ("content-length".to_string(), body.len().to_string()),
            ("content-type".to_string(), content_type.to_string()),
            ("x-content-sha256".to_string(), content_sha256(&body)),
        ];
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn request_target(&self) -> &str {
        &self.request_target
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn additional_headers(&self) -> &[(String, String)] {
        &self.additional_headers
    }

    /// Full list of header names covered by the signature, in order
    pub fn signed_header_names(&self) -> Vec<&str> {
        let mut names = vec!["(request-target)", "host", "date"];
        names.extend(self.additional_headers.iter().map(|(name, _)| name.as_str()));
        names
    }

    pub fn url(&self) -> String {
        let mut url = String::with_capacity(8 + self.host.len() + self.request_target.len());
        url.push_str("https://");
        url.push_str(&self.host);
        url.push_str(&self.request_target);
        url
    }

    /// Sign the descriptor and assemble the outgoing request.
    ///
    /// Header order: `Host`, `Date`, `Authorization`, then `Content-Type`,
    /// `Content-Length`, `x-content-sha256` when a body is present.
    pub fn sign(self, signer: &RequestSigner) -> Result<HttpRequest> {
        let authorization = signer.sign(
            self.method.as_str(),
            &self.host,
            &self.date,
            &self.request_target,
            &self.additional_headers,
        )?;

        let mut headers = Vec::with_capacity(3 + self.additional_headers.len());
        headers.push(("Host".to_string(), self.host.clone()));
        headers.push(("Date".to_string(), self.date.clone()));
        headers.push(("Authorization".to_string(), authorization));

        if self.body.is_some() {
            let lookup = |name: &str| {
                self.additional_headers
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            };
            headers.push(("Content-Type".to_string(), lookup("content-type")));
            headers.push(("Content-Length".to_string(), lookup("content-length")));
            headers.push(("x-content-sha256".to_string(), lookup("x-content-sha256")));
        }

        let url = self.url();
        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body: self.body,
        })
    }
}
