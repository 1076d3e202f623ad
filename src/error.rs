//! @ai:module:intent Define error types for batch runs
//! @ai:module:layer domain
//! @ai:module:public_api Error, BatchError, TransportError, Result
//! @ai:module:stateless true

use thiserror::Error;

/// @ai:intent Fatal errors that stop a run before or outside batch processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("No requests to run")]
    EmptyInput,

    #[error("Duplicate request id: {0}")]
    DuplicateId(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

/// @ai:intent Failure of a single batch submission
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Batch endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed batch payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Access token not found in ${0}")]
    MissingToken(String),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// @ai:intent Non-fatal, per-occurrence failure reported inside a run's outcomes
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Batch submission failed: {source}")]
    Transport {
        ids: Vec<String>,
        payload: String,
        #[source]
        source: TransportError,
    },

    #[error("Request {id} failed with status {status}: {message}")]
    Item {
        id: String,
        status: u16,
        message: String,
    },

    #[error("Retry of throttled requests [{}] failed: {source}", .ids.join(", "))]
    ThrottleRetry {
        ids: Vec<String>,
        #[source]
        source: TransportError,
    },

    #[error("Requests [{}] still throttled after {rounds} retries", .ids.join(", "))]
    RetriesExhausted { ids: Vec<String>, rounds: u32 },

    #[error("No response returned for request {id}")]
    MissingResponse { id: String },
}

impl BatchError {
    /// @ai:intent Request ids this failure covers
    /// @ai:effects pure
    pub fn ids(&self) -> Vec<String> {
        match self {
            BatchError::Item { id, .. } | BatchError::MissingResponse { id } => vec![id.clone()],
            BatchError::Transport { ids, .. }
            | BatchError::ThrottleRetry { ids, .. }
            | BatchError::RetriesExhausted { ids, .. } => ids.clone(),
        }
    }

    /// @ai:intent Whether the failure covers a whole submission rather than one item
    /// @ai:effects pure
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BatchError::Transport { .. } | BatchError::ThrottleRetry { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_covers_chunk_ids() {
        let err = BatchError::Transport {
            ids: vec!["1".to_string(), "2".to_string()],
            payload: r#"{"requests":[{"id":"1","method":"GET","url":"/me"},{"id":"2","method":"GET","url":"/users"}]}"#
                .to_string(),
            source: TransportError::Unavailable("offline".to_string()),
        };

        assert_eq!(err.ids(), vec!["1", "2"]);
        assert!(err.is_transport());
    }

    #[test]
    fn test_item_error_message() {
        let err = BatchError::Item {
            id: "7".to_string(),
            status: 404,
            message: "Resource not found".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Request 7 failed with status 404: Resource not found"
        );
        assert!(!err.is_transport());
    }
}
