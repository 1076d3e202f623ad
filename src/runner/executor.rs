//! @ai:module:intent Batch execution loop with throttling-aware retries
//! @ai:module:layer application
//! @ai:module:public_api BatchRunner, create_runner
//! @ai:module:stateless false

use crate::chunk::{chunk_requests, Chunk, MAX_BATCH_SIZE};
use crate::config::{BatchConfig, RunConfig};
use crate::error::{BatchError, Result, TransportError};
use crate::input::validate_requests;
use crate::report::{Outcome, RunReport, RunStats, Success};
use crate::request::{BatchEnvelope, ItemStatus, RequestItem, ResponseItem};
use crate::runner::throttle::{retry_interval, Sleeper, TokioSleeper};
use crate::runner::transport::{BatchTransport, GraphTransport};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Collects outcomes in emission order and forwards each one to the caller.
struct Sink<F> {
    outcomes: Vec<Outcome>,
    stats: RunStats,
    on_outcome: F,
}

impl<F: FnMut(&Outcome)> Sink<F> {
    fn emit(&mut self, outcome: Outcome) {
        self.stats.record(&outcome);
        (self.on_outcome)(&outcome);
        self.outcomes.push(outcome);
    }
}

/// @ai:intent Runs request lists against a batch endpoint
pub struct BatchRunner<T: BatchTransport, S: Sleeper = TokioSleeper> {
    transport: Arc<T>,
    sleeper: S,
    config: RunConfig,
}

impl<T: BatchTransport> BatchRunner<T, TokioSleeper> {
    /// @ai:intent Create a runner that sleeps on the tokio timer
    /// @ai:effects pure
    pub fn new(transport: Arc<T>, config: RunConfig) -> Self {
        Self::with_sleeper(transport, TokioSleeper, config)
    }
}

impl<T: BatchTransport, S: Sleeper> BatchRunner<T, S> {
    /// @ai:intent Create a runner with a custom sleeper (for testing)
    /// @ai:effects pure
    pub fn with_sleeper(transport: Arc<T>, sleeper: S, config: RunConfig) -> Self {
        Self {
            transport,
            sleeper,
            config,
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// @ai:intent Run every request and collect all outcomes
    /// @ai:pre requests non-empty with unique ids
    /// @ai:effects network, time
    pub async fn run(&self, requests: &[RequestItem]) -> Result<RunReport> {
        self.run_each(requests, |_| {}).await
    }

    /// @ai:intent Run every request, handing each outcome to `on_outcome` as it is produced
    /// @ai:pre requests non-empty with unique ids
    /// @ai:post report.outcomes holds the same outcomes in the same order
    /// @ai:effects network, time
    pub async fn run_each<F>(&self, requests: &[RequestItem], on_outcome: F) -> Result<RunReport>
    where
        F: FnMut(&Outcome),
    {
        validate_requests(requests)?;

        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();

        let batch_size = self.config.batch_size.clamp(1, MAX_BATCH_SIZE);
        let chunks = chunk_requests(requests, batch_size);

        let mut sink = Sink {
            outcomes: Vec::with_capacity(requests.len()),
            stats: RunStats {
                requested: requests.len(),
                ..Default::default()
            },
            on_outcome,
        };

        for chunk in &chunks {
            tracing::info!(
                "Submitting batch {}/{} ({} requests)",
                chunk.index + 1,
                chunks.len(),
                chunk.len()
            );
            self.run_chunk(chunk, &mut sink).await;
        }

        sink.stats.elapsed_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Run finished: {} succeeded, {} failed, {} transport errors",
            sink.stats.succeeded,
            sink.stats.failed,
            sink.stats.transport_errors
        );

        Ok(RunReport {
            started_at,
            outcomes: sink.outcomes,
            stats: sink.stats,
        })
    }

    /// @ai:intent Submit one chunk, then resubmit its throttled subset until none remain
    /// @ai:post immediate results are emitted before any retry round's results
    /// @ai:effects network, time
    async fn run_chunk<F: FnMut(&Outcome)>(&self, chunk: &Chunk, sink: &mut Sink<F>) {
        let mut pending: Vec<RequestItem> = chunk.items.clone();
        let mut round: u32 = 0;

        loop {
            let (payload, result) = self.submit(&pending).await;
            sink.stats.batches_sent += 1;

            let responses = match result {
                Ok(responses) => responses,
                Err(source) => {
                    let ids = ids_of(&pending);
                    let err = if round == 0 {
                        tracing::error!("Batch {} submission failed: {}", chunk.index + 1, source);
                        BatchError::Transport {
                            ids,
                            payload,
                            source,
                        }
                    } else {
                        tracing::error!(
                            "Retry round {} of batch {} failed: {}",
                            round,
                            chunk.index + 1,
                            source
                        );
                        BatchError::ThrottleRetry { ids, source }
                    };
                    sink.emit(Err(err));
                    return;
                }
            };

            let throttled = self.classify(&pending, &responses, sink);
            if throttled.is_empty() {
                return;
            }

            sink.stats.throttled += throttled.len();
            let throttled_ids: HashSet<&str> = throttled.iter().map(|r| r.id.as_str()).collect();
            let retry: Vec<RequestItem> = pending
                .iter()
                .filter(|request| throttled_ids.contains(request.id.as_str()))
                .cloned()
                .collect();

            if let Some(max_rounds) = self.config.max_throttle_rounds {
                if round >= max_rounds {
                    tracing::warn!(
                        "Giving up on {} throttled requests after {} retries",
                        retry.len(),
                        round
                    );
                    sink.emit(Err(BatchError::RetriesExhausted {
                        ids: ids_of(&retry),
                        rounds: round,
                    }));
                    return;
                }
            }

            let interval = retry_interval(&throttled, self.config.default_retry_after_secs);
            tracing::warn!(
                "{} requests throttled, retrying in {}s",
                retry.len(),
                interval.as_secs()
            );
            self.sleeper.sleep(interval).await;

            round += 1;
            sink.stats.throttle_rounds += 1;
            pending = retry;
        }
    }

    /// Serialize and send; the payload is returned so failures can carry it.
    async fn submit(
        &self,
        items: &[RequestItem],
    ) -> (String, std::result::Result<Vec<ResponseItem>, TransportError>) {
        match serde_json::to_string(&BatchEnvelope::from_items(items)) {
            Ok(payload) => {
                let result = self.transport.send_batch(&payload).await;
                (payload, result)
            }
            Err(e) => (String::new(), Err(TransportError::Json(e))),
        }
    }

    /// @ai:intent Emit successes and failures, returning the throttled responses
    /// @ai:effects state:write
    fn classify<'r, F: FnMut(&Outcome)>(
        &self,
        pending: &[RequestItem],
        responses: &'r [ResponseItem],
        sink: &mut Sink<F>,
    ) -> Vec<&'r ResponseItem> {
        let submitted: HashSet<&str> = pending.iter().map(|r| r.id.as_str()).collect();
        let mut answered: HashSet<&str> = HashSet::with_capacity(responses.len());
        let mut throttled = Vec::new();

        for response in responses {
            if !submitted.contains(response.id.as_str()) {
                tracing::warn!("Ignoring response for unknown request id {}", response.id);
                continue;
            }
            if !answered.insert(response.id.as_str()) {
                tracing::warn!("Ignoring duplicate response for request {}", response.id);
                continue;
            }

            match ItemStatus::classify(response.status, self.config.retry_server_errors) {
                ItemStatus::Success => sink.emit(Ok(Success {
                    id: response.id.clone(),
                    body: response.body.clone(),
                })),
                ItemStatus::Throttled => throttled.push(response),
                ItemStatus::Failed => {
                    let message = response.error_message();
                    tracing::warn!(
                        "Request {} failed ({}): {}",
                        response.id,
                        response.status,
                        message
                    );
                    sink.emit(Err(BatchError::Item {
                        id: response.id.clone(),
                        status: response.status,
                        message,
                    }));
                }
            }
        }

        for request in pending {
            if !answered.contains(request.id.as_str()) {
                tracing::warn!("No response for request {}", request.id);
                sink.emit(Err(BatchError::MissingResponse {
                    id: request.id.clone(),
                }));
            }
        }

        throttled
    }
}

fn ids_of(items: &[RequestItem]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}

/// @ai:intent Create a runner against the configured Graph endpoint
/// @ai:pre the token environment variable named in config is set
/// @ai:effects env
pub fn create_runner(config: &BatchConfig) -> Result<BatchRunner<GraphTransport>> {
    config.validate()?;
    let transport = GraphTransport::new(&config.api)?;
    Ok(BatchRunner::new(Arc::new(transport), config.run.clone()))
}
