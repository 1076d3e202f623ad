//! @ai:module:intent Outcomes and statistics of a batch run
//! @ai:module:layer domain
//! @ai:module:public_api Success, Outcome, RunStats, RunReport, OutcomeRecord
//! @ai:module:stateless true

use crate::error::{BatchError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// @ai:intent A sub-request that completed with a 2xx status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Success {
    pub id: String,
    pub body: Value,
}

/// One emitted result: a success or a non-fatal failure.
pub type Outcome = std::result::Result<Success, BatchError>;

/// @ai:intent Counters collected while running
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub requested: usize,
    pub succeeded: usize,
    /// Item-level failures (including retries exhausted and missing responses)
    pub failed: usize,
    pub transport_errors: usize,
    /// Throttled responses seen across all rounds
    pub throttled: usize,
    pub throttle_rounds: u32,
    pub batches_sent: usize,
    pub elapsed_ms: u64,
}

impl RunStats {
    /// @ai:intent Count one outcome
    /// @ai:effects state:write
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Ok(_) => self.succeeded += 1,
            Err(err) if err.is_transport() => self.transport_errors += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// @ai:intent Everything a run produced, in emission order
#[derive(Debug)]
pub struct RunReport {
    pub started_at: String,
    pub outcomes: Vec<Outcome>,
    pub stats: RunStats,
}

impl RunReport {
    /// @ai:effects pure
    pub fn successes(&self) -> impl Iterator<Item = &Success> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    /// @ai:effects pure
    pub fn errors(&self) -> impl Iterator<Item = &BatchError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    /// @ai:intent Whether any failure was reported
    /// @ai:effects pure
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// @ai:intent Serializable view of the outcomes
    /// @ai:effects pure
    pub fn records(&self) -> Vec<OutcomeRecord> {
        self.outcomes.iter().map(OutcomeRecord::from).collect()
    }

    /// @ai:intent Write the report as pretty JSON
    /// @ai:effects fs:write
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let document = ReportDocument {
            started_at: &self.started_at,
            stats: &self.stats,
            outcomes: self.records(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    started_at: &'a str,
    stats: &'a RunStats,
    outcomes: Vec<OutcomeRecord>,
}

/// @ai:intent Flat, serializable form of an Outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeRecord {
    Success {
        id: String,
        body: Value,
    },
    Error {
        kind: String,
        ids: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        message: String,
        /// Serialized envelope of a batch whose submission failed
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
    },
}

impl From<&Outcome> for OutcomeRecord {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Ok(success) => OutcomeRecord::Success {
                id: success.id.clone(),
                body: success.body.clone(),
            },
            Err(err) => {
                let (kind, status, payload) = match err {
                    BatchError::Transport { payload, .. } => {
                        ("transport", None, Some(payload.clone()))
                    }
                    BatchError::Item { status, .. } => ("item", Some(*status), None),
                    BatchError::ThrottleRetry { .. } => ("throttle_retry", None, None),
                    BatchError::RetriesExhausted { .. } => ("retries_exhausted", None, None),
                    BatchError::MissingResponse { .. } => ("missing_response", None, None),
                };

                OutcomeRecord::Error {
                    kind: kind.to_string(),
                    ids: err.ids(),
                    status,
                    message: err.to_string(),
                    payload,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_report() -> RunReport {
        let outcomes: Vec<Outcome> = vec![
            Ok(Success {
                id: "1".to_string(),
                body: json!({"displayName": "Adele"}),
            }),
            Err(BatchError::Item {
                id: "2".to_string(),
                status: 404,
                message: "not found".to_string(),
            }),
            Err(BatchError::ThrottleRetry {
                ids: vec!["3".to_string()],
                source: TransportError::Unavailable("offline".to_string()),
            }),
        ];

        let mut stats = RunStats {
            requested: 3,
            ..Default::default()
        };
        outcomes.iter().for_each(|o| stats.record(o));

        RunReport {
            started_at: "2026-10-19T00:00:00Z".to_string(),
            outcomes,
            stats,
        }
    }

    #[test]
    fn test_stats_count_outcome_kinds() {
        let report = sample_report();
        assert_eq!(report.stats.succeeded, 1);
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.transport_errors, 1);
        assert!(report.has_errors());
    }

    #[test]
    fn test_item_record_keeps_status() {
        let report = sample_report();
        let records = report.records();

        assert_eq!(
            records[1],
            OutcomeRecord::Error {
                kind: "item".to_string(),
                ids: vec!["2".to_string()],
                status: Some(404),
                message: "Request 2 failed with status 404: not found".to_string(),
                payload: None,
            }
        );
    }

    #[test]
    fn test_write_json_report() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.json");

        let payload = r#"{"requests":[{"id":"4","method":"GET","url":"/me"}]}"#;
        let mut report = sample_report();
        report.outcomes.push(Err(BatchError::Transport {
            ids: vec!["4".to_string()],
            payload: payload.to_string(),
            source: TransportError::Status {
                status: 401,
                body: "InvalidAuthenticationToken".to_string(),
            },
        }));

        report.write_json(&path).unwrap();

        let content: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["stats"]["requested"], 3);
        assert_eq!(content["outcomes"][0]["outcome"], "success");
        assert_eq!(content["outcomes"][2]["kind"], "throttle_retry");
        assert!(content["outcomes"][2].get("payload").is_none());
        assert_eq!(content["outcomes"][3]["kind"], "transport");
        assert_eq!(content["outcomes"][3]["payload"], payload);
    }
}
