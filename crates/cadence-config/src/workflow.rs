use serde::{Deserialize, Serialize};

use crate::config::ConfigDef;
use crate::job::JobDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  /// "@hourly", "@daily", "manual" or a cron expression. Defaults to daily.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub schedule_interval: Option<String>,
  /// Chain jobs in listed order instead of using `depends_on`.
  #[serde(default)]
  pub sequential: bool,
  #[serde(default)]
  pub configs: Vec<ConfigDef>,
  pub jobs: Vec<JobDef>,
}
