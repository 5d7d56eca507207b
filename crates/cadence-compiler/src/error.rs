use cadence_env::EnvError;
use cadence_workflow::WorkflowError;

/// Errors that abort a compile.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
  /// Environment or config resolution failed.
  #[error(transparent)]
  Env(#[from] EnvError),

  /// The workflow definition is invalid.
  #[error(transparent)]
  Workflow(#[from] WorkflowError),

  /// A job refers to a config that the definition does not declare.
  #[error("job '{job_id}' reads unknown config '{config}'")]
  UnknownConfig { job_id: String, config: String },

  /// A job reads two distinct configs that share a name.
  #[error("job '{job_id}' reads more than one config named '{config}'")]
  ConflictingConfig { job_id: String, config: String },

  /// Two configs in one definition share a name.
  #[error("duplicate config name: {name}")]
  DuplicateConfig { name: String },
}
