use super::{Fetch, TransportError};
use crate::types::{RequestBody, RequestInit, RequestTarget};
use crate::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Proxy};
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

/// Client-level defaults for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Whole-request deadline for every call, including reading the response
    /// body. `None` (the default) leaves calls unbounded like plain fetch;
    /// a per-call [`RequestInit::timeout`] applies either way.
    pub timeout: Option<Duration>,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy_url: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            proxy_url: None,
        }
    }
}

impl HttpTransportConfig {
    /// Defaults overridden by `CODEX_HTTP_TIMEOUT_SECS`,
    /// `CODEX_HTTP_POOL_MAX_IDLE_PER_HOST`, `CODEX_HTTP_POOL_IDLE_TIMEOUT_SECS`
    /// and `CODEX_PROXY_URL`. Unparsable numbers keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            timeout: secs("CODEX_HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .or(defaults.timeout),
            pool_max_idle_per_host: lookup("CODEX_HTTP_POOL_MAX_IDLE_PER_HOST")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .unwrap_or(defaults.pool_max_idle_per_host),
            pool_idle_timeout: secs("CODEX_HTTP_POOL_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.pool_idle_timeout),
            proxy_url: lookup("CODEX_PROXY_URL").filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Plain network fetch backed by `reqwest`.
///
/// Non-2xx responses are returned as responses, not errors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::from_config(&HttpTransportConfig::from_env())
    }

    pub fn from_config(cfg: &HttpTransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(cfg.pool_max_idle_per_host)
            .pool_idle_timeout(Some(cfg.pool_idle_timeout))
            // Conservative HTTP/2 keepalive defaults for long-lived connections.
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy_url) = &cfg.proxy_url {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(proxy = %proxy_url, error = %e, "ignoring invalid proxy URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Target headers overlaid with init headers. A name present in init
    /// replaces every target value for that name; repeated names within one
    /// source are all kept.
    fn build_headers(target: &RequestTarget, init: &RequestInit) -> Result<HeaderMap> {
        let mut headers = Self::header_map(target.headers())?;
        let overrides = Self::header_map(&init.headers)?;
        for name in overrides.keys() {
            headers.remove(name);
        }
        for (name, value) in overrides.iter() {
            headers.append(name.clone(), value.clone());
        }
        Ok(headers)
    }

    fn header_map(pairs: &[(String, String)]) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::Other(format!("invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::Other(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl Fetch for HttpTransport {
    type Response = reqwest::Response;

    async fn fetch(
        &self,
        target: RequestTarget,
        init: Option<RequestInit>,
    ) -> Result<reqwest::Response> {
        let init = init.unwrap_or_default();
        let method = init
            .method
            .clone()
            .or_else(|| target.method().cloned())
            .unwrap_or(Method::GET);
        let headers = Self::build_headers(&target, &init)?;

        let mut req = self
            .client
            .request(method.clone(), target.url().clone())
            .headers(headers);

        req = match init.body {
            Some(RequestBody::Text(text)) => req.body(text),
            Some(RequestBody::Bytes(bytes)) => req.body(bytes),
            Some(RequestBody::Form(pairs)) => req.form(&pairs),
            None => req,
        };

        if let Some(timeout) = init.timeout {
            req = req.timeout(timeout);
        }

        debug!(%method, url = %target.url(), "sending request");

        let response = match init.signal {
            Some(signal) => {
                if signal.is_aborted() {
                    return Err(TransportError::Aborted.into());
                }
                tokio::select! {
                    biased;
                    _ = signal.aborted() => return Err(TransportError::Aborted.into()),
                    r = req.send() => r,
                }
            }
            None => req.send().await,
        }
        .map_err(|e| crate::Error::Transport(TransportError::Http(e)))?;

        debug!(status = %response.status(), "received response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetRequest;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("CODEX_HTTP_TIMEOUT_SECS", "5"),
            ("CODEX_HTTP_POOL_MAX_IDLE_PER_HOST", "many"),
            ("CODEX_PROXY_URL", "  "),
        ]
        .into_iter()
        .collect();
        let cfg = HttpTransportConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.timeout, Some(Duration::from_secs(5)));
        assert_eq!(cfg.pool_max_idle_per_host, 32);
        assert_eq!(cfg.pool_idle_timeout, Duration::from_secs(90));
        assert_eq!(cfg.proxy_url, None);
    }

    #[test]
    fn init_headers_replace_target_headers() {
        let url = url::Url::parse("http://localhost/v1").unwrap();
        let target: RequestTarget = TargetRequest::new(Method::POST, url)
            .with_header("content-type", "text/plain")
            .with_header("x-base", "1")
            .into();
        let init = RequestInit::new().with_header("Content-Type", "application/json");

        let headers = HttpTransport::build_headers(&target, &init).unwrap();
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(headers.get("x-base").unwrap(), "1");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn client_timeout_defaults_to_none() {
        let cfg = HttpTransportConfig::from_lookup(|_| None);
        assert_eq!(cfg, HttpTransportConfig::default());
        assert_eq!(cfg.timeout, None);
    }

    #[test]
    fn repeated_init_headers_are_all_sent() {
        let url = url::Url::parse("http://localhost/v1").unwrap();
        let target: RequestTarget = TargetRequest::new(Method::GET, url)
            .with_header("accept", "text/plain")
            .with_header("x-tag", "t1")
            .with_header("x-tag", "t2")
            .into();
        let init = RequestInit::new()
            .with_header("accept", "a")
            .with_header("accept", "b");

        let headers = HttpTransport::build_headers(&target, &init).unwrap();
        let accept: Vec<_> = headers
            .get_all("accept")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(accept, vec!["a", "b"]);
        let tags: Vec<_> = headers
            .get_all("x-tag")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(tags, vec!["t1", "t2"]);
    }

    #[test]
    fn invalid_header_name_is_a_transport_error() {
        let target = RequestTarget::parse("http://localhost/").unwrap();
        let init = RequestInit::new().with_header("bad header", "v");
        let err = HttpTransport::build_headers(&target, &init).unwrap_err();
        assert!(err.is_transport());
    }
}
