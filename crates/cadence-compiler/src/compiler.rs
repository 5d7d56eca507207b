use std::collections::{BTreeMap, HashMap};

use cadence_env::{Environment, EnvironmentRegistry, Params};
use cadence_workflow::{Job, Workflow, WorkflowError};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::artifact::{CompiledNode, CompiledWorkflow};
use crate::error::CompileError;

/// Compiler turns a Workflow into a CompiledWorkflow.
pub trait Compiler {
  /// Compile a workflow for one environment.
  ///
  /// This process:
  /// 1. Validates the dependency graph (unique ids, no cycles, no unknown upstreams)
  /// 2. Resolves every config a job reads against `env`
  /// 3. Computes the first start time from `now` and the schedule interval
  /// 4. Emits nodes in topological order with their retry policies
  fn compile(
    &self,
    workflow: &Workflow,
    env: &Environment,
    now: DateTime<Utc>,
  ) -> Result<CompiledWorkflow, CompileError>;
}

/// Standard compiler implementation.
#[derive(Debug, Clone, Default)]
pub struct GraphCompiler {
  overrides: Params,
}

impl GraphCompiler {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parameter values that replace configured ones wherever a config
  /// declares the parameter.
  pub fn with_overrides(mut self, overrides: Params) -> Self {
    self.overrides = overrides;
    self
  }

  /// Compile against the current time.
  pub fn compile_now(
    &self,
    workflow: &Workflow,
    env: &Environment,
  ) -> Result<CompiledWorkflow, CompileError> {
    self.compile(workflow, env, Utc::now())
  }

  /// Compile against the registry's active environment and the current time.
  pub fn compile_active(
    &self,
    workflow: &Workflow,
    registry: &EnvironmentRegistry,
  ) -> Result<CompiledWorkflow, CompileError> {
    let env = registry.active()?;
    self.compile_now(workflow, env)
  }

  fn compile_node(&self, job: &Job, env: &Environment) -> Result<CompiledNode, CompileError> {
    let mut configs = BTreeMap::new();
    for config in job.configs() {
      if configs.contains_key(config.name()) {
        warn!(job_id = %job.id(), config = %config.name(), "conflicting config names");
        return Err(CompileError::ConflictingConfig {
          job_id: job.id().to_string(),
          config: config.name().to_string(),
        });
      }
      let values = config
        .resolve_with_overrides(env, &self.overrides)
        .inspect_err(|e| {
          warn!(
            job_id = %job.id(),
            config = %config.name(),
            error = %e,
            "config resolution failed"
          )
        })?;
      configs.insert(config.name().to_string(), values);
    }

    let retry = job.retry();
    Ok(CompiledNode {
      job_id: job.id().to_string(),
      upstream: job.upstream().to_vec(),
      retries: retry.retries,
      retry_pause_ms: u64::try_from(retry.pause.as_millis()).unwrap_or(u64::MAX),
      task: job.descriptor(),
      configs,
    })
  }
}

impl Compiler for GraphCompiler {
  #[instrument(
    name = "workflow_compile",
    skip(self, workflow),
    fields(workflow_id = %workflow.workflow_id(), environment = %env)
  )]
  fn compile(
    &self,
    workflow: &Workflow,
    env: &Environment,
    now: DateTime<Utc>,
  ) -> Result<CompiledWorkflow, CompileError> {
    let graph = workflow
      .graph()
      .inspect_err(|e| warn!(error = %e, "invalid workflow graph"))?;

    let jobs: HashMap<&str, &Job> = workflow.jobs().iter().map(|job| (job.id(), job)).collect();

    let mut nodes = Vec::with_capacity(graph.len());
    for job_id in graph.order() {
      let job = jobs
        .get(job_id.as_str())
        .ok_or_else(|| WorkflowError::JobNotFound(job_id.clone()))?;
      let node = self.compile_node(job, env)?;
      debug!(job_id = %node.job_id, configs = node.configs.len(), "node compiled");
      nodes.push(node);
    }

    let start_time = workflow.first_start(now)?;

    info!(
      nodes = nodes.len(),
      schedule_interval = %workflow.schedule_interval(),
      start_time = ?start_time,
      "workflow_compiled"
    );

    Ok(CompiledWorkflow {
      workflow_id: workflow.workflow_id().to_string(),
      environment: env.clone(),
      schedule_interval: workflow.schedule_interval().clone(),
      start_time,
      nodes,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cadence_env::{EnvError, MultiEnvConfig};
  use cadence_workflow::{JobContext, JobResult, ScheduleInterval};
  use chrono::TimeZone;
  use serde_json::json;
  use std::sync::Arc;

  fn noop(_ctx: &JobContext) -> JobResult {
    Ok(())
  }

  fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
  }

  fn dataset() -> Arc<MultiEnvConfig> {
    Arc::new(
      MultiEnvConfig::new("dataset")
        .add_configuration("dev", json!({ "table": "t_dev" }))
        .unwrap()
        .add_configuration("prod", json!({ "table": "t_prod" }))
        .unwrap(),
    )
  }

  #[test]
  fn test_compile_hourly_workflow() {
    let workflow = Workflow::new(
      "events",
      vec![
        Job::new("job_a", noop),
        Job::to_scheduled("job_b", noop, 1, 5.0)
          .unwrap()
          .depends_on(["job_a"]),
      ],
    )
    .with_schedule(ScheduleInterval::Hourly);

    let compiled = GraphCompiler::new()
      .compile(&workflow, &Environment::from("dev"), at(10, 15))
      .unwrap();

    assert_eq!(compiled.workflow_id, "events");
    assert_eq!(compiled.environment.as_str(), "dev");
    assert_eq!(compiled.schedule_interval, ScheduleInterval::Hourly);
    assert_eq!(compiled.start_time, Some(at(11, 0)));
    assert_eq!(compiled.node_ids().collect::<Vec<_>>(), vec!["job_a", "job_b"]);

    let job_b = compiled.get_node("job_b").unwrap();
    assert_eq!(job_b.upstream, vec!["job_a"]);
    assert_eq!(job_b.retries, 1);
    assert_eq!(job_b.retry_pause_ms, 5000);
  }

  #[test]
  fn test_retry_pause_survives_the_artifact() {
    let job = Job::to_scheduled("load", noop, 2, 0.0015).unwrap();
    let expected = job.retry();
    let workflow = Workflow::new("events", vec![job]);

    let compiled = GraphCompiler::new()
      .compile(&workflow, &Environment::from("dev"), at(10, 15))
      .unwrap();
    assert_eq!(compiled.get_node("load").unwrap().retry_policy(), expected);
  }

  #[test]
  fn test_job_reading_two_configs_with_one_name_fails() {
    let shadow = MultiEnvConfig::new("dataset")
      .add_configuration("dev", json!({ "table": "t_shadow" }))
      .unwrap();
    let workflow = Workflow::new(
      "events",
      vec![Job::new("load", noop).reads(dataset()).reads(shadow)],
    );

    let result = GraphCompiler::new().compile(&workflow, &Environment::from("dev"), at(10, 15));
    assert!(matches!(
      result,
      Err(CompileError::ConflictingConfig { ref job_id, ref config })
        if job_id == "load" && config == "dataset"
    ));
  }

  #[test]
  fn test_job_reading_same_config_twice_compiles() {
    let config = dataset();
    let workflow = Workflow::new(
      "events",
      vec![Job::new("load", noop).reads(config.clone()).reads(config)],
    );

    let compiled = GraphCompiler::new()
      .compile(&workflow, &Environment::from("dev"), at(10, 15))
      .unwrap();
    assert_eq!(compiled.get_node("load").unwrap().configs.len(), 1);
  }

  #[test]
  fn test_compile_resolves_configs_for_environment() {
    let workflow = Workflow::new("events", vec![Job::new("load", noop).reads(dataset())]);

    let compiled = GraphCompiler::new()
      .compile(&workflow, &Environment::from("prod"), at(10, 15))
      .unwrap();

    let node = compiled.get_node("load").unwrap();
    assert_eq!(node.configs["dataset"].get_str("table"), Some("t_prod"));
    assert_eq!(node.configs["dataset"].environment().as_str(), "prod");
  }

  #[test]
  fn test_compile_unknown_environment_fails() {
    let workflow = Workflow::new("events", vec![Job::new("load", noop).reads(dataset())]);

    let result = GraphCompiler::new().compile(&workflow, &Environment::from("staging"), at(10, 15));
    assert!(matches!(
      result,
      Err(CompileError::Env(EnvError::UnknownEnvironment { ref environment, .. }))
        if environment.as_str() == "staging"
    ));
  }

  #[test]
  fn test_compile_cycle_fails() {
    let workflow = Workflow::new(
      "events",
      vec![
        Job::new("a", noop).depends_on(["c"]),
        Job::new("b", noop).depends_on(["a"]),
        Job::new("c", noop).depends_on(["b"]),
      ],
    );

    let result = GraphCompiler::new().compile(&workflow, &Environment::from("dev"), at(10, 15));
    assert!(matches!(
      result,
      Err(CompileError::Workflow(WorkflowError::CyclicDependency { .. }))
    ));
  }

  #[test]
  fn test_compile_with_overrides() {
    let workflow = Workflow::new("events", vec![Job::new("load", noop).reads(dataset())]);
    let mut overrides = Params::new();
    overrides.insert("table".to_string(), json!("t_backfill"));

    let compiled = GraphCompiler::new()
      .with_overrides(overrides)
      .compile(&workflow, &Environment::from("dev"), at(10, 15))
      .unwrap();

    let node = compiled.get_node("load").unwrap();
    assert_eq!(node.configs["dataset"].get_str("table"), Some("t_backfill"));
  }

  #[test]
  fn test_compile_active_requires_initialized_registry() {
    let workflow = Workflow::new("events", vec![Job::new("load", noop)]);
    let registry = EnvironmentRegistry::new();

    assert!(matches!(
      GraphCompiler::new().compile_active(&workflow, &registry),
      Err(CompileError::Env(EnvError::NotInitialized))
    ));

    registry.set_active("dev").unwrap();
    let compiled = GraphCompiler::new()
      .compile_active(&workflow, &registry)
      .unwrap();
    assert_eq!(compiled.environment.as_str(), "dev");
  }
}
