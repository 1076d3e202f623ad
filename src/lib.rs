//! @ai:module:intent Batch HTTP sub-requests against a `$batch` endpoint with throttling-aware retries
//! @ai:module:layer application
//! @ai:module:public_api config, chunk, error, input, output, report, request, runner
//!
//! # graph-batch
//!
//! Splits a list of sub-requests into batches of at most 20, submits each
//! batch, and resubmits throttled (429) items after the server's Retry-After.
//!
//! ```rust,no_run
//! use graph_batch::{create_runner, BatchConfig, RequestItem};
//!
//! # async fn demo() -> graph_batch::Result<()> {
//! let runner = create_runner(&BatchConfig::default())?;
//! let report = runner
//!     .run(&[RequestItem::get("1", "/me"), RequestItem::get("2", "/me/manager")])
//!     .await?;
//! for success in report.successes() {
//!     println!("{} -> {}", success.id, success.body);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod report;
pub mod request;
pub mod runner;

pub use chunk::{chunk_requests, Chunk, MAX_BATCH_SIZE};
pub use config::{ApiConfig, BatchConfig, RunConfig};
pub use error::{BatchError, Error, Result, TransportError};
pub use input::{load_requests, parse_requests, validate_requests};
pub use output::{format_plan, format_record, format_summary, OutputFormat};
pub use report::{Outcome, OutcomeRecord, RunReport, RunStats, Success};
pub use request::{BatchEnvelope, BatchResponse, ItemStatus, RequestItem, ResponseItem};
pub use runner::{
    create_runner, BatchRunner, BatchTransport, GraphTransport, MockTransport, RecordingSleeper,
    Sleeper, TokioSleeper,
};
