use std::time::Duration;

use crate::error::WorkflowError;

/// How an executor reacts when a job's body fails.
///
/// `retries` is the number of additional attempts after the first failure;
/// zero means the job is not retried. `pause` is the wait between attempts,
/// kept at millisecond resolution by [`RetryPolicy::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub retries: u32,
  pub pause: Duration,
}

impl RetryPolicy {
  pub const DEFAULT_RETRIES: u32 = 3;
  pub const DEFAULT_PAUSE: Duration = Duration::from_secs(60);

  /// Build a policy from author-supplied values.
  ///
  /// Fails with [`WorkflowError::InvalidRetryPolicy`] when either value is
  /// negative, the pause is not finite, or the count does not fit in `u32`.
  /// The pause is rounded to the nearest millisecond.
  pub fn new(job_id: &str, retries: i64, pause_seconds: f64) -> Result<Self, WorkflowError> {
    let invalid = |message: String| WorkflowError::InvalidRetryPolicy {
      job_id: job_id.to_string(),
      message,
    };

    if retries < 0 {
      return Err(invalid(format!("retry count must be non-negative, got {retries}")));
    }
    let retries =
      u32::try_from(retries).map_err(|_| invalid(format!("retry count {retries} is too large")))?;

    if pause_seconds.is_nan() || pause_seconds < 0.0 {
      return Err(invalid(format!(
        "retry pause must be non-negative, got {pause_seconds}"
      )));
    }
    let out_of_range = || invalid(format!("retry pause {pause_seconds} is out of range"));
    let exact = Duration::try_from_secs_f64(pause_seconds).map_err(|_| out_of_range())?;
    let millis =
      u64::try_from((exact.as_nanos() + 500_000) / 1_000_000).map_err(|_| out_of_range())?;
    let pause = Duration::from_millis(millis);

    Ok(Self { retries, pause })
  }

  /// A policy that never retries.
  pub fn none() -> Self {
    Self {
      retries: 0,
      pause: Duration::ZERO,
    }
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      retries: Self::DEFAULT_RETRIES,
      pause: Self::DEFAULT_PAUSE,
    }
  }
}
