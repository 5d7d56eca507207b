use std::collections::BTreeMap;

use cadence_env::{ConfigValueSet, Environment};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::WorkflowError;

/// Accepted runtime formats, most specific first. The first one is also
/// used to render [`JobContext::runtime_as_str`].
pub const RUNTIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d"];

/// Parse a runtime string in one of [`RUNTIME_FORMATS`].
///
/// A date without a time means midnight.
pub fn parse_runtime(runtime: &str) -> Result<NaiveDateTime, WorkflowError> {
  let runtime = runtime.trim();
  if let Ok(dt) = NaiveDateTime::parse_from_str(runtime, RUNTIME_FORMATS[0]) {
    return Ok(dt);
  }
  if let Some(dt) = NaiveDate::parse_from_str(runtime, RUNTIME_FORMATS[1])
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
  {
    return Ok(dt);
  }
  Err(WorkflowError::InvalidRuntime {
    runtime: runtime.to_string(),
    expected: RUNTIME_FORMATS.iter().map(|f| f.to_string()).collect(),
  })
}

/// Everything a job body gets when the executor invokes it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobContext {
  pub workflow_id: String,
  pub job_id: String,
  pub environment: Environment,
  /// Logical time of the run.
  pub runtime: NaiveDateTime,
  pub runtime_as_str: String,
  configs: BTreeMap<String, ConfigValueSet>,
}

impl JobContext {
  pub fn new(
    workflow_id: impl Into<String>,
    job_id: impl Into<String>,
    environment: Environment,
    runtime: NaiveDateTime,
  ) -> Self {
    Self {
      workflow_id: workflow_id.into(),
      job_id: job_id.into(),
      environment,
      runtime,
      runtime_as_str: runtime.format(RUNTIME_FORMATS[0]).to_string(),
      configs: BTreeMap::new(),
    }
  }

  /// Like [`new`](Self::new), with the runtime given as a string.
  ///
  /// The original string is kept as `runtime_as_str`.
  pub fn from_runtime_str(
    workflow_id: impl Into<String>,
    job_id: impl Into<String>,
    environment: Environment,
    runtime: &str,
  ) -> Result<Self, WorkflowError> {
    let parsed = parse_runtime(runtime)?;
    let mut ctx = Self::new(workflow_id, job_id, environment, parsed);
    ctx.runtime_as_str = runtime.trim().to_string();
    Ok(ctx)
  }

  /// Attach a resolved config, keyed by its config name. A set with the same
  /// config name is replaced; compiled nodes never carry two.
  pub fn with_config(mut self, values: ConfigValueSet) -> Self {
    self.configs.insert(values.config_name().to_string(), values);
    self
  }

  /// Resolved config by name.
  pub fn config(&self, name: &str) -> Option<&ConfigValueSet> {
    self.configs.get(name)
  }

  pub fn configs(&self) -> impl Iterator<Item = &ConfigValueSet> {
    self.configs.values()
  }
}
