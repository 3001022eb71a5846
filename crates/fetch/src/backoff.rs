use std::time::Duration;

/// Wait before retry number `attempt` (1 = the first retry).
///
/// - A zero `base` never waits.
/// - Without `exponential` every retry waits `base`.
/// - With `exponential` the wait doubles each time: `base * 2^(attempt - 1)`.
///
/// There is no jitter and no upper bound, so large retry counts combined with
/// exponential growth get very long very quickly. Only a result that can't be
/// represented as a [`Duration`] at all saturates to [`Duration::MAX`].
///
/// ```
/// use std::time::Duration;
/// use parcel_fetch::compute_backoff;
///
/// let base = Duration::from_millis(100);
/// assert_eq!(compute_backoff(1, base, true), Duration::from_millis(100));
/// assert_eq!(compute_backoff(3, base, true), Duration::from_millis(400));
/// assert_eq!(compute_backoff(3, base, false), Duration::from_millis(100));
/// assert_eq!(compute_backoff(3, Duration::ZERO, true), Duration::ZERO);
/// ```
pub fn compute_backoff(attempt: u32, base: Duration, exponential: bool) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    if !exponential {
        return base;
    }
    2_u32
        .checked_pow(attempt.saturating_sub(1))
        .and_then(|multiplier| base.checked_mul(multiplier))
        .unwrap_or(Duration::MAX)
}
