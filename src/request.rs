//! @ai:module:intent Wire types for batch envelopes and per-item status classification
//! @ai:module:layer domain
//! @ai:module:public_api RequestItem, ResponseItem, BatchEnvelope, BatchResponse, ItemStatus
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// @ai:intent One logical sub-request inside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestItem {
    /// Correlation id, unique within one run
    pub id: String,
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestItem {
    /// @ai:intent Create a request without headers or body
    /// @ai:effects pure
    pub fn new(id: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            url: url.into(),
            headers: None,
            body: None,
        }
    }

    /// @ai:intent Shorthand for a GET request
    /// @ai:effects pure
    pub fn get(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(id, "GET", url)
    }
}

/// @ai:intent One result returned by the batch endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseItem {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ResponseItem {
    /// @ai:intent Create a response with an empty header map
    /// @ai:effects pure
    pub fn new(id: impl Into<String>, status: u16, body: Value) -> Self {
        Self {
            id: id.into(),
            status,
            body,
            headers: BTreeMap::new(),
        }
    }

    /// @ai:intent Builder-style header insertion
    /// @ai:effects pure
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// @ai:intent Case-insensitive header lookup
    /// @ai:effects pure
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// @ai:intent Retry-After header as whole seconds, if present and numeric
    /// @ai:effects pure
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.header("Retry-After")
            .and_then(|value| value.trim().parse::<u64>().ok())
    }

    /// @ai:intent Server-provided error message for a failed item
    /// @ai:post falls back to a string body, then to "HTTP <status>"
    /// @ai:effects pure
    pub fn error_message(&self) -> String {
        if let Some(message) = self
            .body
            .pointer("/error/message")
            .and_then(Value::as_str)
        {
            return message.to_string();
        }

        match &self.body {
            Value::String(text) if !text.is_empty() => text.clone(),
            _ => format!("HTTP {}", self.status),
        }
    }
}

/// @ai:intent Request payload sent to the batch endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEnvelope {
    pub requests: Vec<RequestItem>,
}

impl BatchEnvelope {
    /// @ai:intent Build an envelope from borrowed requests
    /// @ai:effects pure
    pub fn from_items(items: &[RequestItem]) -> Self {
        Self {
            requests: items.to_vec(),
        }
    }
}

/// @ai:intent Decoded reply of the batch endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub responses: Vec<ResponseItem>,
}

/// @ai:intent Bucket a response item falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Success,
    Throttled,
    Failed,
}

impl ItemStatus {
    /// @ai:intent Classify an HTTP status code
    /// @ai:pre retry_server_errors decides whether 503/504 are retried like 429
    /// @ai:effects pure
    pub fn classify(status: u16, retry_server_errors: bool) -> Self {
        match status {
            200..=299 => ItemStatus::Success,
            429 => ItemStatus::Throttled,
            503 | 504 if retry_server_errors => ItemStatus::Throttled,
            _ => ItemStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_classify_buckets() {
        assert_eq!(ItemStatus::classify(200, false), ItemStatus::Success);
        assert_eq!(ItemStatus::classify(204, false), ItemStatus::Success);
        assert_eq!(ItemStatus::classify(429, false), ItemStatus::Throttled);
        assert_eq!(ItemStatus::classify(404, false), ItemStatus::Failed);
        assert_eq!(ItemStatus::classify(500, false), ItemStatus::Failed);
        assert_eq!(ItemStatus::classify(302, false), ItemStatus::Failed);
    }

    #[test]
    fn test_classify_server_errors_when_retry_enabled() {
        assert_eq!(ItemStatus::classify(503, true), ItemStatus::Throttled);
        assert_eq!(ItemStatus::classify(504, true), ItemStatus::Throttled);
        assert_eq!(ItemStatus::classify(500, true), ItemStatus::Failed);
        assert_eq!(ItemStatus::classify(503, false), ItemStatus::Failed);
    }

    #[test]
    fn test_retry_after_is_case_insensitive() {
        let response = ResponseItem::new("1", 429, Value::Null).with_header("retry-after", "7");
        assert_eq!(response.retry_after_secs(), Some(7));

        let dated = ResponseItem::new("2", 429, Value::Null)
            .with_header("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(dated.retry_after_secs(), None);
    }

    #[test]
    fn test_error_message_fallbacks() {
        let graph = ResponseItem::new(
            "1",
            404,
            json!({"error": {"code": "Request_ResourceNotFound", "message": "Resource '42' does not exist"}}),
        );
        assert_eq!(graph.error_message(), "Resource '42' does not exist");

        let text = ResponseItem::new("2", 400, json!("bad request"));
        assert_eq!(text.error_message(), "bad request");

        let empty = ResponseItem::new("3", 403, Value::Null);
        assert_eq!(empty.error_message(), "HTTP 403");
    }

    #[test]
    fn test_envelope_omits_absent_fields() {
        let envelope = BatchEnvelope::from_items(&[RequestItem::get("1", "/me")]);
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"requests":[{"id":"1","method":"GET","url":"/me"}]}"#);
    }

    #[test]
    fn test_response_defaults_missing_fields() {
        let response: BatchResponse =
            serde_json::from_str(r#"{"responses":[{"id":"1","status":204}]}"#).unwrap();
        assert_eq!(response.responses[0].body, Value::Null);
        assert!(response.responses[0].headers.is_empty());
    }
}
