use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("job '{job_id}' has an invalid retry policy: {message}")]
  InvalidRetryPolicy { job_id: String, message: String },

  #[error("duplicate job id: {job_id}")]
  DuplicateJob { job_id: String },

  #[error("cyclic dependency: {}", cycle.join(" -> "))]
  CyclicDependency { cycle: Vec<String> },

  #[error("job '{job_id}' depends on unknown job '{dependency}'")]
  UnknownDependency { job_id: String, dependency: String },

  #[error("job not found: {0}")]
  JobNotFound(String),

  #[error("invalid schedule interval '{schedule}': {message}")]
  InvalidSchedule { schedule: String, message: String },

  #[error("start time for schedule '{schedule}' is out of range")]
  StartTimeOutOfRange { schedule: String },

  #[error("unable to parse runtime '{runtime}' (expected one of {expected:?})")]
  InvalidRuntime {
    runtime: String,
    expected: Vec<String>,
  },
}
