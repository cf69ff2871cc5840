//! Request body filtering.
//!
//! [`BodyFilter`] removes top-level token-limit keys from JSON string bodies.
//! Bodies that are not strings (binary payloads, form data) and JSON values
//! that are not objects are left exactly as they were.

mod config;

pub use config::{
    FilterConfig, InvalidJsonPolicy, DEFAULT_STRIPPED_FIELDS, ENV_ON_INVALID_JSON,
    ENV_STRIP_FIELDS,
};

use crate::types::{RequestBody, RequestInit};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyFilter {
    fields: Vec<String>,
    on_invalid_json: InvalidJsonPolicy,
}

impl BodyFilter {
    pub fn new() -> Self {
        Self::from_config(&FilterConfig::default())
    }

    pub fn from_config(cfg: &FilterConfig) -> Self {
        Self {
            fields: cfg.strip_fields.clone(),
            on_invalid_json: cfg.on_invalid_json,
        }
    }

    /// Also strip `field`.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
        self
    }

    pub fn with_invalid_json_policy(mut self, policy: InvalidJsonPolicy) -> Self {
        self.on_invalid_json = policy;
        self
    }

    pub fn stripped_fields(&self) -> &[String] {
        &self.fields
    }

    pub fn invalid_json_policy(&self) -> InvalidJsonPolicy {
        self.on_invalid_json
    }

    /// Filter the init options of a fetch call.
    ///
    /// Everything except a rewritten `Text` body is returned untouched.
    pub fn apply(&self, init: Option<RequestInit>) -> Result<Option<RequestInit>> {
        let Some(mut init) = init else {
            return Ok(None);
        };
        // An empty string counts as no body.
        let text = init
            .body
            .as_ref()
            .and_then(RequestBody::as_text)
            .filter(|t| !t.is_empty());
        let rewritten = match text {
            Some(text) => self.filter_body(text)?,
            None => None,
        };
        if let Some(body) = rewritten {
            init.body = Some(RequestBody::Text(body));
        }
        Ok(Some(init))
    }

    /// Filter a serialized JSON body.
    ///
    /// Returns `Some(new_body)` when the body was re-serialized and `None` when
    /// the original must be forwarded as-is.
    pub fn filter_body(&self, body: &str) -> Result<Option<String>> {
        let mut value: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => return self.on_parse_failure(e),
        };

        let Some(map) = value.as_object_mut() else {
            debug!("request body is JSON but not an object, forwarding unchanged");
            return Ok(None);
        };

        let mut removed = Vec::new();
        for field in &self.fields {
            if map.shift_remove(field).is_some() {
                removed.push(field.as_str());
            }
        }
        if !removed.is_empty() {
            debug!(fields = ?removed, "stripped fields from request body");
        }

        Ok(Some(serde_json::to_string(&value)?))
    }

    fn on_parse_failure(&self, e: serde_json::Error) -> Result<Option<String>> {
        match self.on_invalid_json {
            InvalidJsonPolicy::Passthrough => {
                warn!(error = %e, "request body is not valid JSON, forwarding unchanged");
                Ok(None)
            }
            InvalidJsonPolicy::Error => Err(Error::invalid_body(
                e,
                ErrorContext::new()
                    .with_field_path("init.body")
                    .with_source("body_filter"),
            )),
        }
    }
}

impl Default for BodyFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    fn parsed(body: &str) -> Value {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn strips_max_output_tokens() {
        let out = BodyFilter::new()
            .filter_body(r#"{"model":"gpt-5","max_output_tokens":500,"messages":[]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(parsed(&out), json!({"model": "gpt-5", "messages": []}));
    }

    #[test]
    fn strips_both_limits_and_keeps_the_rest() {
        let out = BodyFilter::new()
            .filter_body(
                r#"{"max_completion_tokens":1,"temperature":0.2,"max_output_tokens":2,"stream":true}"#,
            )
            .unwrap()
            .unwrap();
        assert_eq!(parsed(&out), json!({"temperature": 0.2, "stream": true}));
    }

    #[test]
    fn preserves_key_order() {
        let out = BodyFilter::new()
            .filter_body(r#"{"z":1,"max_output_tokens":3,"a":2}"#)
            .unwrap()
            .unwrap();
        assert_eq!(out, r#"{"z":1,"a":2}"#);
    }

    #[test]
    fn nested_keys_are_not_touched() {
        let body = r#"{"text":{"max_output_tokens":5}}"#;
        let out = BodyFilter::new().filter_body(body).unwrap().unwrap();
        assert_eq!(parsed(&out), parsed(body));
    }

    #[test]
    fn non_object_json_is_forwarded_unchanged() {
        let filter = BodyFilter::new();
        for body in ["[1,2]", "42", "\"max_output_tokens\"", "null"] {
            assert_eq!(filter.filter_body(body).unwrap(), None, "body {}", body);
        }
    }

    #[test]
    fn malformed_json_passthrough_is_stable() {
        let filter = BodyFilter::new();
        for _ in 0..3 {
            assert_eq!(filter.filter_body("not-json").unwrap(), None);
        }
    }

    #[test]
    fn malformed_json_error_policy() {
        let filter = BodyFilter::new().with_invalid_json_policy(InvalidJsonPolicy::Error);
        let err = filter.filter_body("not-json").unwrap_err();
        assert!(matches!(err, Error::InvalidBody { .. }));
        assert_eq!(
            err.context().and_then(|c| c.source.as_deref()),
            Some("body_filter")
        );
    }

    #[test]
    fn empty_body_is_treated_as_absent() {
        let filter = BodyFilter::new().with_invalid_json_policy(InvalidJsonPolicy::Error);
        let init = RequestInit::json("");
        assert_eq!(filter.apply(Some(init.clone())).unwrap(), Some(init));
    }

    #[test]
    fn apply_leaves_non_text_bodies_alone() {
        let filter = BodyFilter::new();
        assert_eq!(filter.apply(None).unwrap(), None);

        let no_body = RequestInit::new().with_header("x", "y");
        assert_eq!(filter.apply(Some(no_body.clone())).unwrap(), Some(no_body));

        let bytes = RequestInit::new()
            .with_body(Bytes::from_static(br#"{"max_output_tokens":1}"#));
        assert_eq!(filter.apply(Some(bytes.clone())).unwrap(), Some(bytes));

        let form = RequestInit::new().with_body(RequestBody::Form(vec![(
            "max_output_tokens".into(),
            "1".into(),
        )]));
        assert_eq!(filter.apply(Some(form.clone())).unwrap(), Some(form));
    }

    #[test]
    fn apply_preserves_other_init_fields() {
        let init = RequestInit::json(r#"{"model":"gpt-5","max_completion_tokens":9}"#)
            .with_header("authorization", "Bearer k")
            .with_timeout(std::time::Duration::from_secs(5));

        let out = BodyFilter::new().apply(Some(init.clone())).unwrap().unwrap();
        assert_eq!(out.method, init.method);
        assert_eq!(out.headers, init.headers);
        assert_eq!(out.timeout, init.timeout);
        assert_eq!(
            out.body.as_ref().and_then(RequestBody::as_text).map(parsed),
            Some(json!({"model": "gpt-5"}))
        );
    }

    #[test]
    fn custom_fields_come_from_config() {
        let cfg = FilterConfig {
            strip_fields: vec!["previous_response_id".into()],
            ..FilterConfig::default()
        };
        let out = BodyFilter::from_config(&cfg)
            .filter_body(r#"{"previous_response_id":"r_1","max_output_tokens":5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(parsed(&out), json!({"max_output_tokens": 5}));
    }

    #[test]
    fn with_field_does_not_duplicate() {
        let filter = BodyFilter::new().with_field("max_output_tokens");
        assert_eq!(filter.stripped_fields().len(), 2);
    }
}
