//! Tile image fetching with bounded retry.
//!
//! One fetch is a fixed number of attempts against the rendering
//! provider. The policy distinguishes three failure shapes; the
//! asymmetry is deliberate courtesy toward the upstream service:
//!
//! - rate limited (HTTP 429): wait `2^attempt` before the next attempt
//! - transport failure: wait `2^attempt`, but only if attempts remain
//! - any other non-success status: consume the attempt without waiting
//!
//! When the attempts are exhausted the tile is simply absent; a failed
//! tile never aborts the batch.

use std::time::Duration;

use tracing::warn;

use crate::coord::Rect;
use crate::provider::{ProviderError, RenderProvider};

/// Default attempt ceiling per tile.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff before the attempt after `attempt` (0-based): `2^attempt`
/// time units.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt))
}

/// Trait for blocking waits, so tests can observe them.
///
/// Production uses [`ThreadSleeper`]; the whole pipeline is one thread,
/// so a plain blocking sleep is the correct primitive.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fetches rendered tile images with the fixed-attempt retry policy.
pub struct TileFetcher<P: RenderProvider, S: Sleeper> {
    provider: P,
    sleeper: S,
    max_attempts: u32,
}

impl<P: RenderProvider> TileFetcher<P, ThreadSleeper> {
    /// Creates a fetcher with the default attempt ceiling and a real
    /// sleeper.
    pub fn new(provider: P) -> Self {
        Self::with_sleeper(provider, ThreadSleeper)
    }
}

impl<P: RenderProvider, S: Sleeper> TileFetcher<P, S> {
    /// Creates a fetcher with an explicit sleeper.
    pub fn with_sleeper(provider: P, sleeper: S) -> Self {
        Self {
            provider,
            sleeper,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the attempt ceiling.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is zero.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(max_attempts > 0, "max_attempts must be strictly positive");
        self.max_attempts = max_attempts;
        self
    }

    /// Fetch the rendered image for `bounds`, or `None` once every
    /// attempt is exhausted.
    pub fn fetch(&self, bounds: &Rect, bearer_token: &str) -> Option<Vec<u8>> {
        for attempt in 0..self.max_attempts {
            match self.provider.render(bounds, bearer_token) {
                Ok(response) if response.is_success() => return Some(response.body),
                Ok(response) if response.is_rate_limited() => {
                    let wait = backoff_delay(attempt);
                    warn!(wait_secs = wait.as_secs(), "rate limited, backing off");
                    self.sleeper.sleep(wait);
                }
                Ok(response) => {
                    warn!(
                        status = response.status,
                        body = %response.body_text(),
                        "render request rejected"
                    );
                }
                Err(err) => {
                    warn!(attempt = attempt + 1, error = %err, "render request failed");
                    if attempt + 1 < self.max_attempts {
                        self.sleeper.sleep(backoff_delay(attempt));
                    }
                }
            }
        }

        None
    }
}
