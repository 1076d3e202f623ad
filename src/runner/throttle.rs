//! @ai:module:intent Back-off interval for throttled items and the sleep used to honour it
//! @ai:module:layer infrastructure
//! @ai:module:public_api Sleeper, TokioSleeper, RecordingSleeper, retry_interval
//! @ai:module:stateless false

use crate::request::ResponseItem;
use std::sync::Mutex;
use std::time::Duration;

/// @ai:intent Wait for the server-requested back-off
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// @ai:intent Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    /// @ai:effects time
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// @ai:intent Records requested waits without sleeping (for testing)
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Waits requested so far, in order
    /// @ai:effects pure
    pub fn waits(&self) -> Vec<Duration> {
        self.waits
            .lock()
            .map(|waits| waits.clone())
            .unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    /// @ai:effects state:write
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

/// @ai:intent Longest Retry-After among throttled responses
/// @ai:pre throttled responses only
/// @ai:post default_secs only when no response carries a numeric Retry-After
/// @ai:effects pure
pub fn retry_interval(throttled: &[&ResponseItem], default_secs: u64) -> Duration {
    let secs = throttled
        .iter()
        .filter_map(|response| response.retry_after_secs())
        .max()
        .unwrap_or(default_secs);

    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn throttled(id: &str, retry_after: Option<&str>) -> ResponseItem {
        let response = ResponseItem::new(id, 429, Value::Null);
        match retry_after {
            Some(value) => response.with_header("Retry-After", value),
            None => response,
        }
    }

    #[test]
    fn test_interval_is_maximum_retry_after() {
        let a = throttled("a", Some("3"));
        let b = throttled("b", Some("12"));
        let c = throttled("c", Some("7"));

        assert_eq!(retry_interval(&[&a, &b, &c], 5), Duration::from_secs(12));
    }

    #[test]
    fn test_missing_header_uses_default() {
        let a = throttled("a", None);
        let garbled = throttled("g", Some("soon"));
        assert_eq!(retry_interval(&[&a], 5), Duration::from_secs(5));
        assert_eq!(retry_interval(&[&a, &garbled], 5), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_header_defers_to_present_values() {
        let a = throttled("a", None);
        let b = throttled("b", Some("2"));
        assert_eq!(retry_interval(&[&a, &b], 5), Duration::from_secs(2));
        assert_eq!(retry_interval(&[&b, &a], 5), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_recording_sleeper_does_not_block() {
        let sleeper = RecordingSleeper::new();
        let start = std::time::Instant::now();

        sleeper.sleep(Duration::from_secs(30)).await;
        sleeper.sleep(Duration::from_secs(1)).await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(30), Duration::from_secs(1)]
        );
    }
}
