//! # Waiter Configuration

use std::time::Duration;

/// Wall-clock timeout for a consent wait. Product design value: after five
/// minutes without a decision the debt is treated as expired.
pub const DEFAULT_CONSENT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Cadence of the presentational elapsed-seconds counter.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables for [`crate::ConsentWaiter`].
#[derive(Debug, Clone)]
pub struct WaiterConfig {
    /// Exactly one timer of this duration is armed per `Waiting` session;
    /// its firing resolves the wait as `Expired`.
    pub consent_timeout: Duration,
    /// Interval of the elapsed-time tick. Purely observational; has no
    /// bearing on correctness.
    pub tick_interval: Duration,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            consent_timeout: DEFAULT_CONSENT_TIMEOUT,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl WaiterConfig {
    /// Override the consent timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.consent_timeout = timeout;
        self
    }
}
