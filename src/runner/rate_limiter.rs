//! @ai:module:intent Client-side pacing of batch submissions
//! @ai:module:layer infrastructure
//! @ai:module:public_api RateLimiter, RateLimiterTrait
//! @ai:module:stateless false

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// @ai:intent Trait for pacing outgoing batch submissions
pub trait RateLimiterTrait: Send + Sync {
    /// @ai:intent Wait until one more submission may be sent
    fn acquire(&self) -> impl std::future::Future<Output = ()> + Send;
}

/// @ai:intent Reservation-based token bucket refilled at a fixed number of submissions per minute
pub struct RateLimiter {
    schedule: Mutex<Schedule>,
}

/// Token balance may go negative: each reservation books a slot and
/// the caller sleeps off the deficit once, without re-checking.
struct Schedule {
    balance: f64,
    updated_at: Instant,
    per_second: f64,
    burst: f64,
}

impl Schedule {
    /// @ai:intent Book one submission at `now` and return how long the caller must wait
    /// @ai:post Duration::ZERO when a token was available
    /// @ai:effects state:write
    fn reserve(&mut self, now: Instant) -> Duration {
        let earned = now.saturating_duration_since(self.updated_at).as_secs_f64() * self.per_second;
        self.balance = (self.balance + earned).min(self.burst);
        self.updated_at = now;
        self.balance -= 1.0;

        if self.balance >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-self.balance / self.per_second)
        }
    }
}

impl RateLimiter {
    /// @ai:intent Limiter allowing `per_minute` submissions with an equal burst
    /// @ai:post returns None when per_minute is 0 (pacing disabled)
    /// @ai:effects pure
    pub fn per_minute(per_minute: u32) -> Option<Self> {
        Self::with_burst(per_minute, per_minute)
    }

    /// @ai:intent Limiter with an explicit burst size
    /// @ai:effects pure
    pub fn with_burst(per_minute: u32, burst: u32) -> Option<Self> {
        if per_minute == 0 {
            return None;
        }

        let burst = f64::from(burst.max(1));
        Some(Self {
            schedule: Mutex::new(Schedule {
                balance: burst,
                updated_at: Instant::now(),
                per_second: f64::from(per_minute) / 60.0,
                burst,
            }),
        })
    }
}

impl RateLimiterTrait for RateLimiter {
    /// @ai:effects state:write, time
    async fn acquire(&self) {
        let wait = self.schedule.lock().await.reserve(Instant::now());

        if !wait.is_zero() {
            tracing::debug!("Pacing batch submission for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}
