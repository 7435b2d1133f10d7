use std::time::Duration;

use crate::batch::types::BulkOptions;

/// Normalized retry budget for one bulk operation
///
/// The budget counts attempts permitted *after* the initial call. It is
/// accepted only as a non-negative integer; negative numbers, non-integral
/// numbers and text all normalize silently to zero rather than raising an
/// error. Textual values are never interpreted as numbers, so `"5"` is
/// still zero retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryBudget(usize);

impl RetryBudget {
    /// No retries: the initial call is the only attempt
    pub const ZERO: Self = Self(0);

    /// Number of retries this budget permits
    pub fn limit(&self) -> usize {
        self.0
    }
}

impl From<i32> for RetryBudget {
    fn from(value: i32) -> Self {
        if value >= 0 {
            Self(value as usize)
        } else {
            Self::ZERO
        }
    }
}

impl From<i64> for RetryBudget {
    fn from(value: i64) -> Self {
        if value >= 0 {
            Self(value as usize)
        } else {
            Self::ZERO
        }
    }
}

impl From<f64> for RetryBudget {
    fn from(value: f64) -> Self {
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
            Self(value as usize)
        } else {
            Self::ZERO
        }
    }
}

impl From<&str> for RetryBudget {
    fn from(_: &str) -> Self {
        Self::ZERO
    }
}

/// What the policy decided after seeing one attempt's outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// One more attempt is permitted after the given backoff delay
    Retry(Duration),
    /// The unprocessed set drained; the operation is done
    Complete,
    /// Unprocessed entries remain but the budget is spent
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Attempting,
    Complete,
    Exhausted,
}

/// Retry-budget state machine: `Idle → Attempting → {Complete, Exhausted}`
///
/// `Idle` is the state before the first call. After each attempt the
/// coordinator reports how many entries are still outstanding and the policy
/// decides whether another attempt may run. The retry count it reports never
/// includes the initial call.
#[derive(Debug)]
pub(crate) struct BackoffPolicy {
    budget: RetryBudget,
    initial_delay: Duration,
    max_delay: Duration,
    retries: usize,
    state: State,
}

impl BackoffPolicy {
    pub(crate) fn new(options: &BulkOptions) -> Self {
        Self {
            budget: options.auto_retry,
            initial_delay: options.initial_delay,
            max_delay: options.max_delay,
            retries: 0,
            state: State::Idle,
        }
    }

    /// Mark an attempt as in flight
    pub(crate) fn begin(&mut self) {
        debug_assert!(matches!(self.state, State::Idle | State::Attempting));
        self.state = State::Attempting;
    }

    /// Evaluate an attempt's outcome: `outstanding` is the number of entries
    /// the store left unprocessed
    pub(crate) fn observe(&mut self, outstanding: usize) -> Verdict {
        debug_assert_eq!(self.state, State::Attempting);

        if outstanding == 0 {
            self.state = State::Complete;
            return Verdict::Complete;
        }

        if self.retries == self.budget.limit() {
            self.state = State::Exhausted;
            return Verdict::Exhausted;
        }

        let delay = retry_delay(self.retries, self.initial_delay, self.max_delay);
        self.retries += 1;
        Verdict::Retry(delay)
    }

    /// Retries performed so far, excluding the initial call
    pub(crate) fn retries(&self) -> usize {
        self.retries
    }
}

/// Calculate retry delay with exponential backoff
///
/// `attempt` is 0-based: the first retry waits `initial`, each further retry
/// doubles it, capped at `max`.
fn retry_delay(attempt: usize, initial: Duration, max: Duration) -> Duration {
    let delay_ms = (initial.as_millis() as u64).saturating_mul(2u64.saturating_pow(attempt as u32));
    let capped_delay = delay_ms.min(max.as_millis() as u64);
    Duration::from_millis(capped_delay)
}
