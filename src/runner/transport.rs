//! @ai:module:intent Batch endpoint transports
//! @ai:module:layer infrastructure
//! @ai:module:public_api BatchTransport, GraphTransport, MockTransport
//! @ai:module:stateless false

use crate::config::ApiConfig;
use crate::error::TransportError;
use crate::request::{BatchEnvelope, BatchResponse, RequestItem, ResponseItem};
use crate::runner::rate_limiter::{RateLimiter, RateLimiterTrait};
use reqwest::header::CONTENT_TYPE;
use std::sync::Mutex;
use std::time::Duration;

/// @ai:intent Submits one serialized batch envelope and returns its per-item results
#[allow(async_fn_in_trait)]
pub trait BatchTransport: Send + Sync {
    /// @ai:intent POST the envelope to the batch endpoint
    /// @ai:pre payload is a JSON `{ "requests": [...] }` envelope
    async fn send_batch(&self, payload: &str) -> Result<Vec<ResponseItem>, TransportError>;
}

/// @ai:intent reqwest-backed transport for a Graph-style `$batch` endpoint
pub struct GraphTransport {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    rate_limiter: Option<RateLimiter>,
}

impl GraphTransport {
    /// @ai:intent Create a transport using the token found in `config.token_env`
    /// @ai:pre the token environment variable is set
    /// @ai:effects env
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| TransportError::MissingToken(config.token_env.clone()))?;

        Self::with_token(config, token)
    }

    /// @ai:intent Create a transport with an explicit bearer token
    /// @ai:effects pure
    pub fn with_token(config: &ApiConfig, token: String) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/$batch", config.base_url.trim_end_matches('/')),
            token,
            rate_limiter: RateLimiter::per_minute(config.requests_per_minute),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl BatchTransport for GraphTransport {
    /// @ai:effects network
    async fn send_batch(&self, payload: &str) -> Result<Vec<ResponseItem>, TransportError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let batch: BatchResponse = serde_json::from_str(&text)?;
        Ok(batch.responses)
    }
}

type Responder =
    Box<dyn Fn(usize, &[RequestItem]) -> Result<Vec<ResponseItem>, TransportError> + Send + Sync>;

/// @ai:intent Scripted transport for dry runs and tests
pub struct MockTransport {
    responder: Responder,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockTransport {
    /// @ai:intent Answer each submission with `responder(call_index, requests)`
    /// @ai:effects pure
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(usize, &[RequestItem]) -> Result<Vec<ResponseItem>, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// @ai:intent Answer every item with 200 and echo the request back
    /// @ai:effects pure
    pub fn echo() -> Self {
        Self::new(|_, requests| {
            Ok(requests
                .iter()
                .map(|request| {
                    ResponseItem::new(
                        request.id.clone(),
                        200,
                        serde_json::json!({
                            "method": request.method,
                            "url": request.url,
                        }),
                    )
                })
                .collect())
        })
    }

    /// @ai:intent Ids submitted on each call, in call order
    /// @ai:effects pure
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

impl BatchTransport for MockTransport {
    /// @ai:effects state:write
    async fn send_batch(&self, payload: &str) -> Result<Vec<ResponseItem>, TransportError> {
        let envelope: BatchEnvelope = serde_json::from_str(payload)?;

        let index = match self.calls.lock() {
            Ok(mut calls) => {
                calls.push(envelope.requests.iter().map(|r| r.id.clone()).collect());
                calls.len() - 1
            }
            Err(_) => return Err(TransportError::Unavailable("mock state poisoned".to_string())),
        };

        (self.responder)(index, &envelope.requests)
    }
}
