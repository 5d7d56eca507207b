use thiserror::Error;

use crate::environment::Environment;

/// Errors raised while registering or resolving environment configuration.
#[derive(Debug, Error)]
pub enum EnvError {
  /// The active environment was read before it was set.
  #[error("active environment has not been set")]
  NotInitialized,

  /// A second, different environment was set on an initialized registry.
  #[error("active environment is already '{current}', refusing to switch to '{requested}'")]
  AlreadyInitialized {
    current: Environment,
    requested: Environment,
  },

  /// The registry only accepts a closed set of names.
  #[error("environment '{environment}' is not one of the known environments {known:?}")]
  NotKnown {
    environment: Environment,
    known: Vec<Environment>,
  },

  /// No value set is registered for the environment.
  #[error("config '{config}' has no values for environment '{environment}' (known: {known:?})")]
  UnknownEnvironment {
    config: String,
    environment: Environment,
    known: Vec<Environment>,
  },

  /// The same environment was added twice to one config.
  #[error("config '{config}' already has values for environment '{environment}'")]
  DuplicateEnvironment {
    config: String,
    environment: Environment,
  },

  /// A value set's key set differs from the established schema.
  #[error(
    "config '{config}' environment '{environment}' does not match the schema: missing {missing:?}, unexpected {unexpected:?}"
  )]
  SchemaMismatch {
    config: String,
    environment: Environment,
    missing: Vec<String>,
    unexpected: Vec<String>,
  },

  /// Parameters must be given as a mapping.
  #[error("config '{config}' environment '{environment}' values must be a mapping")]
  InvalidParameters {
    config: String,
    environment: Environment,
  },

  /// A parameter was requested that the value set does not carry.
  #[error("config '{config}' has no parameter '{name}' in environment '{environment}'")]
  MissingParameter {
    config: String,
    environment: Environment,
    name: String,
  },
}
