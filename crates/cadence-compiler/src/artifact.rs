use std::collections::BTreeMap;
use std::time::Duration;

use cadence_env::{ConfigValueSet, Environment};
use cadence_workflow::{Graph, JobContext, RetryPolicy, ScheduleInterval, WorkflowError};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A compiled workflow, ready to hand to a scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledWorkflow {
  pub workflow_id: String,
  pub environment: Environment,
  pub schedule_interval: ScheduleInterval,
  /// First trigger instant. `None` for manually triggered workflows.
  pub start_time: Option<DateTime<Utc>>,
  /// Nodes in topological order.
  pub nodes: Vec<CompiledNode>,
}

/// One job in a compiled workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledNode {
  pub job_id: String,
  #[serde(default)]
  pub upstream: Vec<String>,
  pub retries: u32,
  /// Retry pause in whole milliseconds.
  pub retry_pause_ms: u64,
  /// Executor-side handle for the job body, when it has one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub task: Option<String>,
  /// Resolved configs, keyed by config name.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub configs: BTreeMap<String, ConfigValueSet>,
}

impl CompiledNode {
  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      retries: self.retries,
      pause: Duration::from_millis(self.retry_pause_ms),
    }
  }
}

impl CompiledWorkflow {
  /// Build the graph structure for traversal.
  pub fn graph(&self) -> Result<Graph, WorkflowError> {
    Graph::build(
      self
        .nodes
        .iter()
        .map(|node| (node.job_id.as_str(), node.upstream.as_slice())),
    )
  }

  /// Get a node by job id.
  pub fn get_node(&self, job_id: &str) -> Option<&CompiledNode> {
    self.nodes.iter().find(|node| node.job_id == job_id)
  }

  /// Job ids in topological order.
  pub fn node_ids(&self) -> impl Iterator<Item = &str> {
    self.nodes.iter().map(|node| node.job_id.as_str())
  }

  /// The context an executor passes to a job body for a run at `runtime`.
  pub fn job_context(
    &self,
    job_id: &str,
    runtime: NaiveDateTime,
  ) -> Result<JobContext, WorkflowError> {
    let node = self
      .get_node(job_id)
      .ok_or_else(|| WorkflowError::JobNotFound(job_id.to_string()))?;

    let ctx = JobContext::new(
      &self.workflow_id,
      &node.job_id,
      self.environment.clone(),
      runtime,
    );
    Ok(
      node
        .configs
        .values()
        .cloned()
        .fold(ctx, JobContext::with_config),
    )
  }
}
