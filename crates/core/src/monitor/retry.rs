use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(300);
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(3_000);

/// Bounded exponential backoff for log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE,
            max_delay: MAX_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// Delay before retry `attempt` (1-based): `base * 2^(attempt - 1)`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

const RECOVERABLE_PATTERNS: &[&str] = &[
    "http error 429",
    "status: 429",
    "status code 429",
    "429 too many requests",
    "too many requests",
    "rate limit",
    "http error 503",
    "status: 503",
    "status code 503",
    "service unavailable",
    "no backend is currently healthy",
    "timeout",
    "timed out",
    "connection reset",
    "econnreset",
    "connection closed",
    "error sending request",
    "backend connection task has stopped",
];

/// Classifies an RPC failure message as transient.
pub fn is_recoverable_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    RECOVERABLE_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}
