use chrono::{DateTime, Utc};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::job::Job;
use crate::schedule::{ScheduleInterval, StartTimeRule};

/// A named set of jobs with a schedule.
///
/// A workflow is only a definition. Validation happens when its
/// [`graph`](Self::graph) is built, which the compiler does on every compile.
#[derive(Debug, Clone)]
pub struct Workflow {
  workflow_id: String,
  jobs: Vec<Job>,
  schedule_interval: ScheduleInterval,
  start_time_rule: StartTimeRule,
}

impl Workflow {
  /// Create a workflow from jobs with explicit dependencies.
  pub fn new(workflow_id: impl Into<String>, jobs: Vec<Job>) -> Self {
    Self {
      workflow_id: workflow_id.into(),
      jobs,
      schedule_interval: ScheduleInterval::default(),
      start_time_rule: StartTimeRule::default(),
    }
  }

  /// Create a workflow where each job depends on the one listed before it.
  pub fn sequential(workflow_id: impl Into<String>, jobs: Vec<Job>) -> Self {
    let mut previous: Option<String> = None;
    let jobs = jobs
      .into_iter()
      .map(|job| {
        let job = match previous.take() {
          Some(prev) => job.depends_on([prev]),
          None => job,
        };
        previous = Some(job.id().to_string());
        job
      })
      .collect();
    Self::new(workflow_id, jobs)
  }

  pub fn with_schedule(mut self, interval: ScheduleInterval) -> Self {
    self.schedule_interval = interval;
    self
  }

  pub fn with_start_time_rule(mut self, rule: StartTimeRule) -> Self {
    self.start_time_rule = rule;
    self
  }

  pub fn workflow_id(&self) -> &str {
    &self.workflow_id
  }

  /// Jobs in declaration order.
  pub fn jobs(&self) -> &[Job] {
    &self.jobs
  }

  pub fn schedule_interval(&self) -> &ScheduleInterval {
    &self.schedule_interval
  }

  pub fn start_time_rule(&self) -> &StartTimeRule {
    &self.start_time_rule
  }

  pub fn find_job(&self, job_id: &str) -> Result<&Job, WorkflowError> {
    self
      .jobs
      .iter()
      .find(|job| job.id() == job_id)
      .ok_or_else(|| WorkflowError::JobNotFound(job_id.to_string()))
  }

  /// Validate the dependency graph.
  pub fn graph(&self) -> Result<Graph, WorkflowError> {
    Graph::build(self.jobs.iter().map(|job| (job.id(), job.upstream())))
  }

  /// Jobs in an order where every job follows its upstreams.
  pub fn sequential_order(&self) -> Result<Vec<&Job>, WorkflowError> {
    let graph = self.graph()?;
    graph.order().iter().map(|id| self.find_job(id)).collect()
  }

  /// First trigger instant for this workflow's schedule.
  pub fn first_start(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, WorkflowError> {
    self.start_time_rule.first_start(now, &self.schedule_interval)
  }
}
