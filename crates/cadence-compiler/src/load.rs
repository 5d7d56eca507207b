use std::collections::HashMap;
use std::sync::Arc;

use cadence_config::{ConfigDef, JobDef, WorkflowDef};
use cadence_env::{EnvError, MultiEnvConfig};
use cadence_workflow::{Job, RetryPolicy, ScheduleInterval, TaskRef, Workflow};
use serde_json::Value;
use tracing::debug;

use crate::error::CompileError;

/// Build a multi-environment config from its definition.
pub fn config_from_def(def: ConfigDef) -> Result<MultiEnvConfig, EnvError> {
  let mut config = MultiEnvConfig::new(def.name).with_defaults(Value::Object(def.defaults))?;
  if let Some(env) = def.default_environment {
    config = config.with_default_environment(env);
  }
  for env in def.environments {
    config = config.add_configuration(env.environment, Value::Object(env.values))?;
  }
  Ok(config)
}

/// Build a workflow from its definition.
///
/// Jobs get [`TaskRef`] bodies named after their `task`, and read the
/// configs they list by name.
pub fn workflow_from_def(def: WorkflowDef) -> Result<Workflow, CompileError> {
  let mut configs: HashMap<String, Arc<MultiEnvConfig>> = HashMap::new();
  for config_def in def.configs {
    let config = config_from_def(config_def)?;
    let name = config.name().to_string();
    if configs.insert(name.clone(), Arc::new(config)).is_some() {
      return Err(CompileError::DuplicateConfig { name });
    }
  }

  let jobs = def
    .jobs
    .into_iter()
    .map(|job_def| job_from_def(job_def, &configs))
    .collect::<Result<Vec<_>, _>>()?;

  let schedule = match def.schedule_interval {
    Some(s) => s.parse::<ScheduleInterval>()?,
    None => ScheduleInterval::default(),
  };

  debug!(
    workflow_id = %def.workflow_id,
    jobs = jobs.len(),
    configs = configs.len(),
    "workflow definition loaded"
  );

  let workflow = if def.sequential {
    Workflow::sequential(def.workflow_id, jobs)
  } else {
    Workflow::new(def.workflow_id, jobs)
  };
  Ok(workflow.with_schedule(schedule))
}

fn job_from_def(
  def: JobDef,
  configs: &HashMap<String, Arc<MultiEnvConfig>>,
) -> Result<Job, CompileError> {
  let retries = def
    .retries
    .unwrap_or(i64::from(RetryPolicy::DEFAULT_RETRIES));
  let pause = def
    .retry_pause_seconds
    .unwrap_or(RetryPolicy::DEFAULT_PAUSE.as_secs_f64());

  let mut job = Job::to_scheduled(&def.job_id, TaskRef::new(def.task), retries, pause)?
    .depends_on(def.depends_on);

  for name in def.configs {
    let config = configs
      .get(&name)
      .ok_or_else(|| CompileError::UnknownConfig {
        job_id: def.job_id.clone(),
        config: name.clone(),
      })?;
    job = job.reads(Arc::clone(config));
  }

  Ok(job)
}
