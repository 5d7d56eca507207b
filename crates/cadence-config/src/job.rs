use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDef {
  pub job_id: String,
  /// Executor-side handle for the job body, e.g. "bq:load_events".
  pub task: String,
  // Signed so that negative values reach retry-policy validation instead of
  // failing as a parse error.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub retries: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub retry_pause_seconds: Option<f64>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub depends_on: Vec<String>,
  /// Names of the configs the job reads.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub configs: Vec<String>,
}
