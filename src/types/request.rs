//! Fetch-style request descriptors: a target plus optional init options.

use bytes::Bytes;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Where a request goes. Mirrors the `fetch(input, ...)` argument, which is
/// either a bare URL or a structured request object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    Url(Url),
    Request(TargetRequest),
}

impl RequestTarget {
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Url::parse(url).map(RequestTarget::Url)
    }

    pub fn url(&self) -> &Url {
        match self {
            RequestTarget::Url(url) => url,
            RequestTarget::Request(req) => &req.url,
        }
    }

    /// Method carried by a structured target, if any.
    pub fn method(&self) -> Option<&Method> {
        match self {
            RequestTarget::Url(_) => None,
            RequestTarget::Request(req) => Some(&req.method),
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        match self {
            RequestTarget::Url(_) => &[],
            RequestTarget::Request(req) => &req.headers,
        }
    }
}

impl From<Url> for RequestTarget {
    fn from(url: Url) -> Self {
        RequestTarget::Url(url)
    }
}

impl From<TargetRequest> for RequestTarget {
    fn from(req: TargetRequest) -> Self {
        RequestTarget::Request(req)
    }
}

/// Structured request target (method, URL and base headers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl TargetRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Request body variants. Only [`RequestBody::Text`] is a serialized string
/// and therefore eligible for JSON filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Text(String),
    Bytes(Bytes),
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestBody::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Text(s)
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Text(s.to_string())
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

/// Cancellation handle carried inside [`RequestInit`].
///
/// Two signals compare equal only when they are clones of the same handle.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: Arc<CancellationToken>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once [`AbortSignal::abort`] has been called on any clone.
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }
}

impl PartialEq for AbortSignal {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.token, &other.token)
    }
}

impl Eq for AbortSignal {}

/// Optional per-call options, the `init` half of a fetch call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInit {
    pub method: Option<Method>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
    pub signal: Option<AbortSignal>,
}

impl RequestInit {
    pub fn new() -> Self {
        Self::default()
    }

    /// POST with a JSON string body and a matching content-type header.
    pub fn json(body: impl Into<String>) -> Self {
        Self::new()
            .with_method(Method::POST)
            .with_header("content-type", "application/json")
            .with_body(RequestBody::Text(body.into()))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}
