//! HTTP execution for signed requests
//!
//! - HTTP/1.1 over native-tls (OpenSSL)
//! - Bounded total and connect timeouts
//! - Redirects followed up to a configured limit
//! - One structured log line per call
//! - No retries: transport failures surface to the caller as-is

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LOCATION};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::HttpSettings;
use crate::error::{OciError, Result};
use crate::transport::outcome::{RequestOutcome, TransferMetadata};

/// How much of a failed response body goes into the log line
const LOG_BODY_CHARS: usize = 200;

/// Headers that only verify against the original host
const SIGNATURE_HEADERS: [&str; 3] = ["authorization", "date", "x-content-sha256"];

/// A fully assembled request, ready to send
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Header pairs in send order
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Value of the first header matching `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Rewrite this request for the next redirect hop.
    ///
    /// 303 turns the request into a body-less GET; other codes keep method
    /// and body. `Host` always follows the new authority. Leaving the
    /// original scheme and authority drops the signature headers, and an
    /// https to http downgrade is refused.
    fn redirected(mut self, status: StatusCode, next_url: String) -> Result<Self> {
        let next: Uri = next_url
            .parse()
            .map_err(|e| OciError::Transport(format!("Invalid redirect target {}: {}", next_url, e)))?;
        let current: Option<Uri> = self.url.parse().ok();
        let current_scheme = current.as_ref().and_then(|u| u.scheme_str());

        if current_scheme == Some("https") && next.scheme_str() == Some("http") {
            return Err(OciError::Transport(format!(
                "Refusing redirect from https to http: {}",
                next_url
            )));
        }

        let same_origin = current_scheme == next.scheme_str()
            && current.as_ref().and_then(|u| u.authority()) == next.authority();

        if status == StatusCode::SEE_OTHER && self.method != Method::HEAD {
            self.method = Method::GET;
            self.body = None;
            self.headers.retain(|(k, _)| {
                !k.eq_ignore_ascii_case("content-type")
                    && !k.eq_ignore_ascii_case("content-length")
                    && !k.eq_ignore_ascii_case("x-content-sha256")
            });
        }

        if !same_origin {
            self.headers.retain(|(k, _)| {
                !SIGNATURE_HEADERS.iter().any(|h| k.eq_ignore_ascii_case(h))
            });
        }

        if let Some(authority) = next.authority() {
            for (k, v) in self.headers.iter_mut() {
                if k.eq_ignore_ascii_case("host") {
                    *v = authority.as_str().to_string();
                }
            }
        }

        self.url = next_url;
        Ok(self)
    }
}

/// Executes one request and normalizes the response
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<RequestOutcome>;
}

/// Raw result of the final hop
struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    effective_url: String,
    redirect_count: u32,
}

/// Default executor backed by hyper's pooled client
///
/// Clone is cheap - the underlying client uses Arc internally.
#[derive(Clone)]
pub struct HyperExecutor {
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    settings: HttpSettings,
}

impl HyperExecutor {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(settings.connect_timeout()));

        let tls = if settings.verify_tls {
            TlsConnector::new()
        } else {
            warn!("INSECURE TLS MODE ENABLED: Certificate verification is disabled!");
            TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
        };
        let tls = tls
            .map_err(|e| OciError::Config(format!("Failed to build TLS connector: {}", e)))?;

        let https = HttpsConnector::from((http, tls.into()));
        let client = HyperClient::builder(TokioExecutor::new())
            .set_host(true)
            .build(https);

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    fn build_request(request: &HttpRequest) -> Result<Request<Full<Bytes>>> {
        let mut req = Request::builder()
            .method(request.method.clone())
            .uri(&request.url);
        for (key, value) in request.headers.iter() {
            req = req.header(key, value);
        }

        req.body(Full::new(request.body.clone().unwrap_or_default()))
            .map_err(|e| OciError::Transport(format!("Request build error: {}", e)))
    }

    /// Send the request, following redirects, and collect the final body
    async fn exchange(&self, request: HttpRequest) -> Result<RawResponse> {
        let mut current = request;
        let mut redirect_count = 0u32;

        loop {
            let response = self.client.request(Self::build_request(&current)?).await?;
            let status = response.status();

            if is_followed_redirect(status) {
                if let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string())
                {
                    if redirect_count >= self.settings.max_redirects {
                        return Err(OciError::Transport(format!(
                            "Maximum ({}) redirects followed",
                            self.settings.max_redirects
                        )));
                    }

                    let next_url = resolve_location(&current.url, &location)?;
                    // Drain body to return connection to pool
                    let _ = response.collect().await;

                    debug!(from = %current.url, to = %next_url, status = status.as_u16(), "following redirect");
                    redirect_count += 1;
                    current = current.redirected(status, next_url)?;
                    continue;
                }
            }

            let headers = response.headers().clone();
            let body = response.collect().await?.to_bytes();
            return Ok(RawResponse {
                status,
                headers,
                body,
                effective_url: current.url,
                redirect_count,
            });
        }
    }
}

#[async_trait]
impl HttpExecutor for HyperExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<RequestOutcome> {
        let method = request.method.clone();
        let url = request.url.clone();
        let timeout = self.settings.timeout();
        let start = Instant::now();

        let raw = match tokio::time::timeout(timeout, self.exchange(request)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(method = %method, url = %url, error = %e, "request failed in transport");
                return Err(e);
            }
            Err(_) => {
                let e = OciError::Transport(format!(
                    "Request timed out after {}s",
                    timeout.as_secs()
                ));
                warn!(method = %method, url = %url, error = %e, "request failed in transport");
                return Err(e);
            }
        };

        let metadata = TransferMetadata {
            effective_url: raw.effective_url,
            content_type: header_string(&raw.headers, CONTENT_TYPE.as_str()),
            content_length: header_string(&raw.headers, CONTENT_LENGTH.as_str())
                .and_then(|v| v.parse().ok()),
            request_id: header_string(&raw.headers, "opc-request-id"),
            etag: header_string(&raw.headers, ETAG.as_str()),
            redirect_count: raw.redirect_count,
            total_time_ms: start.elapsed().as_millis() as u64,
        };

        let outcome = RequestOutcome::new(raw.status.as_u16(), raw.body, metadata);
        log_outcome(&method, &url, &outcome);
        Ok(outcome)
    }
}

/// Status codes whose `Location` is followed
fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Resolve a `Location` value against the URL it was returned for
pub(crate) fn resolve_location(base: &str, location: &str) -> Result<String> {
    if location.starts_with("https://") || location.starts_with("http://") {
        return Ok(location.to_string());
    }

    let base_uri: Uri = base
        .parse()
        .map_err(|e| OciError::Transport(format!("Invalid redirect base {}: {}", base, e)))?;
    let scheme = base_uri.scheme_str().unwrap_or("https");

    if let Some(rest) = location.strip_prefix("//") {
        return Ok(format!("{}://{}", scheme, rest));
    }

    let authority = base_uri
        .authority()
        .map(|a| a.as_str())
        .ok_or_else(|| OciError::Transport(format!("Redirect base has no host: {}", base)))?;

    if location.starts_with('/') {
        return Ok(format!("{}://{}{}", scheme, authority, location));
    }

    // Relative to the directory of the current path
    let path = base_uri.path();
    let dir = match path.rfind('/') {
        Some(pos) => &path[..=pos],
        None => "/",
    };
    Ok(format!("{}://{}{}{}", scheme, authority, dir, location))
}

fn log_outcome(method: &Method, url: &str, outcome: &RequestOutcome) {
    if outcome.success() {
        info!(
            method = %method,
            url = %url,
            status = outcome.status(),
            success = true,
            elapsed_ms = outcome.metadata().total_time_ms,
            "request completed"
        );
    } else {
        warn!(
            method = %method,
            url = %url,
            status = outcome.status(),
            success = false,
            request_id = outcome.metadata().request_id.as_deref().unwrap_or("-"),
            error = %outcome.body_snippet(LOG_BODY_CHARS),
            "request completed"
        );
    }
}
