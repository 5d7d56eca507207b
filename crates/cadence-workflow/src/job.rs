use std::fmt;
use std::sync::Arc;

use cadence_env::MultiEnvConfig;

use crate::context::JobContext;
use crate::error::WorkflowError;
use crate::retry::RetryPolicy;

/// Error returned by a failed job body.
pub type JobFailure = Box<dyn std::error::Error + Send + Sync>;

pub type JobResult = Result<(), JobFailure>;

/// A body of work invoked by an external executor.
///
/// Returning an error signals failure; the executor then applies the job's
/// [`RetryPolicy`]. Implemented for any `Fn(&JobContext) -> JobResult`.
pub trait UnitOfWork: Send + Sync {
  fn execute(&self, ctx: &JobContext) -> JobResult;

  /// Handle an executor can use to locate this body out of process.
  fn descriptor(&self) -> Option<String> {
    None
  }

  /// Bind scheduling metadata to this body.
  fn to_scheduled(
    self,
    id: impl Into<String>,
    retry_count: i64,
    retry_pause_seconds: f64,
  ) -> Result<Job, WorkflowError>
  where
    Self: Sized + 'static,
  {
    Job::to_scheduled(id, self, retry_count, retry_pause_seconds)
  }
}

impl<F> UnitOfWork for F
where
  F: Fn(&JobContext) -> JobResult + Send + Sync,
{
  fn execute(&self, ctx: &JobContext) -> JobResult {
    self(ctx)
  }
}

/// A body known only by name, e.g. a job declared in a workflow file.
///
/// It cannot run in process; an executor looks it up through
/// [`UnitOfWork::descriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef(String);

impl TaskRef {
  pub fn new(target: impl Into<String>) -> Self {
    Self(target.into())
  }

  pub fn target(&self) -> &str {
    &self.0
  }
}

impl UnitOfWork for TaskRef {
  fn execute(&self, ctx: &JobContext) -> JobResult {
    Err(
      format!(
        "task '{}' of job '{}' has no in-process body",
        self.0, ctx.job_id
      )
      .into(),
    )
  }

  fn descriptor(&self) -> Option<String> {
    Some(self.0.clone())
  }
}

/// A schedulable unit of work.
#[derive(Clone)]
pub struct Job {
  id: String,
  body: Arc<dyn UnitOfWork>,
  retry: RetryPolicy,
  upstream: Vec<String>,
  configs: Vec<Arc<MultiEnvConfig>>,
}

impl Job {
  /// Create a job with the default retry policy.
  pub fn new(id: impl Into<String>, body: impl UnitOfWork + 'static) -> Self {
    Self {
      id: id.into(),
      body: Arc::new(body),
      retry: RetryPolicy::default(),
      upstream: Vec::new(),
      configs: Vec::new(),
    }
  }

  /// Create a job with an explicit retry policy.
  pub fn to_scheduled(
    id: impl Into<String>,
    body: impl UnitOfWork + 'static,
    retry_count: i64,
    retry_pause_seconds: f64,
  ) -> Result<Self, WorkflowError> {
    let id = id.into();
    let retry = RetryPolicy::new(&id, retry_count, retry_pause_seconds)?;
    Ok(Self::new(id, body).with_retry(retry))
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  /// Declare upstream jobs. Repeated ids are kept once.
  pub fn depends_on<I, S>(mut self, ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    for id in ids {
      let id = id.into();
      if !self.upstream.contains(&id) {
        self.upstream.push(id);
      }
    }
    self
  }

  /// Declare a config the body reads. It is resolved at compile time.
  /// Reading the same config twice is a no-op.
  pub fn reads(mut self, config: impl Into<Arc<MultiEnvConfig>>) -> Self {
    let config = config.into();
    if !self.configs.iter().any(|c| Arc::ptr_eq(c, &config)) {
      self.configs.push(config);
    }
    self
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn retry(&self) -> RetryPolicy {
    self.retry
  }

  pub fn upstream(&self) -> &[String] {
    &self.upstream
  }

  pub fn configs(&self) -> &[Arc<MultiEnvConfig>] {
    &self.configs
  }

  pub fn descriptor(&self) -> Option<String> {
    self.body.descriptor()
  }

  /// Run the body once. Retrying is up to the caller.
  pub fn execute(&self, ctx: &JobContext) -> JobResult {
    self.body.execute(ctx)
  }
}

impl fmt::Debug for Job {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Job")
      .field("id", &self.id)
      .field("retry", &self.retry)
      .field("upstream", &self.upstream)
      .field(
        "configs",
        &self.configs.iter().map(|c| c.name()).collect::<Vec<_>>(),
      )
      .field("descriptor", &self.body.descriptor())
      .finish()
  }
}
