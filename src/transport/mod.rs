//! 传输层：fetch 风格的调用约定与默认 HTTP 实现。
//!
//! Transport layer.
//!
//! Everything that can send a request implements [`Fetch`]. The real network
//! client ([`HttpTransport`]) and the body-filtering wrapper
//! ([`FilteredFetch`]) share that trait, so a filtered fetch can be handed to
//! any code that expects a plain one.

mod filtered;
mod http;

pub use filtered::FilteredFetch;
pub use http::{HttpTransport, HttpTransportConfig};

use crate::types::{RequestInit, RequestTarget};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The `fetch(target, init?)` calling convention.
#[async_trait]
pub trait Fetch: Send + Sync {
    type Response: Send;

    async fn fetch(
        &self,
        target: RequestTarget,
        init: Option<RequestInit>,
    ) -> Result<Self::Response>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for &T {
    type Response = T::Response;

    async fn fetch(
        &self,
        target: RequestTarget,
        init: Option<RequestInit>,
    ) -> Result<Self::Response> {
        (**self).fetch(target, init).await
    }
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Box<T> {
    type Response = T::Response;

    async fn fetch(
        &self,
        target: RequestTarget,
        init: Option<RequestInit>,
    ) -> Result<Self::Response> {
        (**self).fetch(target, init).await
    }
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    type Response = T::Response;

    async fn fetch(
        &self,
        target: RequestTarget,
        init: Option<RequestInit>,
    ) -> Result<Self::Response> {
        (**self).fetch(target, init).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request aborted")]
    Aborted,

    #[error("Transport error: {0}")]
    Other(String),
}
