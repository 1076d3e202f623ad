//! @ai:module:intent Batch submission, throttling and retry
//! @ai:module:layer infrastructure
//! @ai:module:public_api BatchRunner, BatchTransport, GraphTransport, MockTransport, RateLimiter, Sleeper

pub mod executor;
pub mod rate_limiter;
pub mod throttle;
pub mod transport;

pub use executor::{create_runner, BatchRunner};
pub use rate_limiter::{RateLimiter, RateLimiterTrait};
pub use throttle::{retry_interval, RecordingSleeper, Sleeper, TokioSleeper};
pub use transport::{BatchTransport, GraphTransport, MockTransport};
