//! HTTP probe layer.
//!
//! Issues exactly one outbound request per invocation and hands back the raw
//! status, headers and body without interpreting them; classifying a
//! response is the calling check's job. Every call carries the client-level
//! timeout, redirects follow reqwest's defaults, and nothing is retried: a
//! transient failure surfaces as a `ProbeError` for that one call.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::Extensions;
use reqwest::header::HeaderMap;
use reqwest::{Client, Request, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;


/// Default per-request timeout. Callers override it through
/// [`HttpProbe::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("firebase-probe/", env!("CARGO_PKG_VERSION"));

/// Network-level failure of a single probe. The variant preserves the cause
/// so a verdict built from it can tell a timeout from a refused connection
/// from a TLS handshake failure.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to initialize HTTP client: {0}")]
    ClientInit(String),
}

/// A fully materialized outbound request, captured for the debug surface.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ProbeRequest {
    fn from_request(request: &Request) -> Self {
        let headers = request
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = value.to_str().unwrap_or("<binary>").to_string();
                (name.to_string(), value)
            })
            .collect();
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned());

        Self {
            method: request.method().to_string(),
            url: request.url().to_string(),
            headers,
            body,
        }
    }

    /// Renders the request as a curl command line, the form the debug
    /// output prints for copy-paste reproduction.
    pub fn as_curl(&self) -> String {
        let mut cmd = format!("curl -X {} '{}'", self.method, self.url);
        for (name, value) in &self.headers {
            cmd.push_str(&format!(" -H '{name}: {value}'"));
        }
        if let Some(body) = &self.body {
            cmd.push_str(&format!(" -d '{body}'"));
        }
        cmd
    }
}

/// Raw result of one probe. `request` is populated only when the probe was
/// built with debug capture enabled.
#[derive(Debug)]
pub struct ProbeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub request: Option<ProbeRequest>,
}

impl ProbeResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Append-only log of materialized requests, shared between the recorder
/// middleware and the probe that owns it.
#[derive(Clone, Default)]
struct RequestLog(Arc<Mutex<Vec<ProbeRequest>>>);

impl RequestLog {
    fn record(&self, request: ProbeRequest) {
        if let Ok(mut log) = self.0.lock() {
            log.push(request);
        }
    }

    fn last(&self) -> Option<ProbeRequest> {
        self.0.lock().ok().and_then(|log| log.last().cloned())
    }

    fn snapshot(&self) -> Vec<ProbeRequest> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

/// Middleware that snapshots every dispatched request into the log. Sits
/// where an auth-injection middleware would in an authenticated client;
/// here the only job is observability.
struct RequestRecorder {
    log: RequestLog,
}

#[async_trait::async_trait]
impl Middleware for RequestRecorder {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        self.log.record(ProbeRequest::from_request(&req));
        next.run(req, extensions).await
    }
}

/// The probe client. One instance is shared by every check in a run.
pub struct HttpProbe {
    client: ClientWithMiddleware,
    debug: bool,
    log: RequestLog,
}

impl HttpProbe {
    /// Builds a probe with the given per-request timeout. When `debug` is
    /// set, every materialized request is recorded and attached to its
    /// response; verdict logic never looks at it.
    pub fn new(timeout: Duration, debug: bool) -> Result<Self, ProbeError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProbeError::ClientInit(e.to_string()))?;

        let log = RequestLog::default();
        let client = if debug {
            ClientBuilder::new(inner)
                .with(RequestRecorder { log: log.clone() })
                .build()
        } else {
            ClientBuilder::new(inner).build()
        };

        Ok(Self { client, debug, log })
    }

    pub async fn get(
        &self,
        url: &str,
        headers: &[(&str, String)],
    ) -> Result<ProbeResponse, ProbeError> {
        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        self.execute(url, builder).await
    }

    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &Value,
    ) -> Result<ProbeResponse, ProbeError> {
        let mut builder = self.client.post(url).json(body);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        self.execute(url, builder).await
    }

    pub async fn put_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &Value,
    ) -> Result<ProbeResponse, ProbeError> {
        let mut builder = self.client.put(url).json(body);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        self.execute(url, builder).await
    }

    async fn execute(
        &self,
        url: &str,
        builder: reqwest_middleware::RequestBuilder,
    ) -> Result<ProbeResponse, ProbeError> {
        let response = builder
            .send()
            .await
            .map_err(|e| classify_send_error(url, &e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        debug!(%url, status = status.as_u16(), "probe completed");

        let request = if self.debug { self.log.last() } else { None };
        Ok(ProbeResponse { status, headers, body, request })
    }

    /// All requests recorded during this probe's lifetime. Empty unless the
    /// probe was built with debug capture.
    pub fn debug_log(&self) -> Vec<ProbeRequest> {
        self.log.snapshot()
    }
}

fn classify_send_error(url: &str, error: &reqwest_middleware::Error) -> ProbeError {
    if let reqwest_middleware::Error::Reqwest(inner) = error {
        if inner.is_timeout() {
            return ProbeError::Timeout(url.to_string());
        }
        if inner.is_connect() {
            return ProbeError::Connect(format!("{url}: {inner}"));
        }
    }
    ProbeError::Transport(error.to_string())
}
