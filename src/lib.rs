//! # codex-fetch
//!
//! 在转发前移除 AI 补全请求体中的 token 上限字段的 fetch 包装器。
//!
//! Fetch-style wrapper that strips the token-limit fields (`max_output_tokens`,
//! `max_completion_tokens`) from JSON request bodies before the call reaches
//! an AI completion API.
//!
//! ## Overview
//!
//! Some OpenAI-compatible backends reject requests carrying output token
//! limits. [`FilteredFetch`] sits in front of any [`Fetch`] implementation,
//! rewrites JSON string bodies without those keys, and hands the call to the
//! wrapped transport. Responses and transport errors come back untouched.
//!
//! - Bodies that are not strings (bytes, form data) are never touched.
//! - JSON that is not an object is forwarded as-is.
//! - Malformed JSON is forwarded as-is by default; see [`InvalidJsonPolicy`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codex_fetch::{Fetch, FilteredFetch, HttpTransport, RequestInit, RequestTarget};
//!
//! #[tokio::main]
//! async fn main() -> codex_fetch::Result<()> {
//!     let fetch = FilteredFetch::new(HttpTransport::new()?);
//!
//!     let target = RequestTarget::parse("https://api.openai.com/v1/responses").unwrap();
//!     let init = RequestInit::json(r#"{"model":"gpt-5","max_output_tokens":500,"input":"hi"}"#);
//!
//!     // The server receives {"model":"gpt-5","input":"hi"}
//!     let resp = fetch.fetch(target, Some(init)).await?;
//!     println!("{}", resp.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`filter`] | JSON body filtering and its configuration |
//! | [`transport`] | The [`Fetch`] trait, HTTP transport and filtered wrapper |
//! | [`types`] | Request target, init options, bodies and abort signals |

pub mod filter;
pub mod transport;
pub mod types;

pub use filter::{BodyFilter, FilterConfig, InvalidJsonPolicy};
pub use transport::{Fetch, FilteredFetch, HttpTransport, HttpTransportConfig, TransportError};
pub use types::{AbortSignal, RequestBody, RequestInit, RequestTarget, TargetRequest};

use once_cell::sync::OnceCell;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};

static DEFAULT_FETCH: OnceCell<FilteredFetch<HttpTransport>> = OnceCell::new();

/// Filtered fetch through a process-wide [`HttpTransport`].
///
/// The shared instance is built on first use from [`HttpTransportConfig::from_env`]
/// and [`FilterConfig::from_env`]; a configuration error is returned and the
/// next call tries again.
pub async fn fetch(target: RequestTarget, init: Option<RequestInit>) -> Result<reqwest::Response> {
    let fetch = DEFAULT_FETCH.get_or_try_init(|| -> Result<_> {
        let filter = BodyFilter::from_config(&FilterConfig::from_env()?);
        Ok(FilteredFetch::with_filter(HttpTransport::new()?, filter))
    })?;
    fetch.fetch(target, init).await
}
