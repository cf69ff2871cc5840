//! 类型模块：fetch 风格的请求描述。
//!
//! # Types Module
//!
//! Request descriptors handed to a [`Fetch`](crate::transport::Fetch)
//! implementation.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RequestTarget`] | Bare URL or structured request object |
//! | [`RequestInit`] | Optional per-call options (method, headers, body, timeout, signal) |
//! | [`RequestBody`] | Text, binary or form body |
//! | [`AbortSignal`] | Cancellation handle passed through to the transport |
//!
//! ## Example
//!
//! ```rust
//! use codex_fetch::types::{RequestInit, RequestTarget};
//!
//! let target = RequestTarget::parse("https://api.openai.com/v1/responses").unwrap();
//! let init = RequestInit::json(r#"{"model":"gpt-5","max_output_tokens":500}"#);
//! assert!(init.body.is_some());
//! # let _ = target;
//! ```

pub mod request;

pub use request::{AbortSignal, RequestBody, RequestInit, RequestTarget, TargetRequest};
