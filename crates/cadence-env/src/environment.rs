use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EnvError;

/// Process variable read by [`EnvironmentRegistry::from_env_var`] callers.
pub const ENV_VAR: &str = "CADENCE_ENV";

/// A named deployment environment, e.g. "dev" or "prod".
///
/// Names are opaque and carry no ordering semantics beyond what is needed
/// to keep listings stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(String);

impl Environment {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Environment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for Environment {
  fn from(name: &str) -> Self {
    Self(name.to_string())
  }
}

impl From<String> for Environment {
  fn from(name: String) -> Self {
    Self(name)
  }
}

impl From<&Environment> for Environment {
  fn from(env: &Environment) -> Self {
    env.clone()
  }
}

impl AsRef<str> for Environment {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl Borrow<str> for Environment {
  fn borrow(&self) -> &str {
    &self.0
  }
}

/// Holds the active environment for a process.
///
/// The active environment is written once, normally at startup, and read
/// many times afterwards. Writes are serialized through a [`OnceLock`]:
/// setting the same name again is a no-op, setting a different name fails
/// with [`EnvError::AlreadyInitialized`].
///
/// Library code should take the resolved [`Environment`] as a parameter;
/// the registry only supplies that value at the process boundary.
#[derive(Debug, Default)]
pub struct EnvironmentRegistry {
  /// Names accepted by `set_active`. Empty means any name is accepted.
  known: BTreeSet<Environment>,
  active: OnceLock<Environment>,
}

impl EnvironmentRegistry {
  /// Create a registry that accepts any environment name.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a registry restricted to the given environment names.
  pub fn with_known<I, E>(names: I) -> Self
  where
    I: IntoIterator<Item = E>,
    E: Into<Environment>,
  {
    Self {
      known: names.into_iter().map(Into::into).collect(),
      active: OnceLock::new(),
    }
  }

  /// The process-wide registry.
  pub fn global() -> &'static EnvironmentRegistry {
    static GLOBAL: OnceLock<EnvironmentRegistry> = OnceLock::new();
    GLOBAL.get_or_init(EnvironmentRegistry::new)
  }

  /// Record `env` as the active environment.
  pub fn set_active(&self, env: impl Into<Environment>) -> Result<&Environment, EnvError> {
    let env = env.into();

    if !self.is_known(&env) {
      return Err(EnvError::NotKnown {
        environment: env,
        known: self.known.iter().cloned().collect(),
      });
    }

    let mut initialized = false;
    let current = self.active.get_or_init(|| {
      initialized = true;
      env.clone()
    });

    if *current != env {
      warn!(current = %current, requested = %env, "active environment already set");
      return Err(EnvError::AlreadyInitialized {
        current: current.clone(),
        requested: env,
      });
    }

    if initialized {
      info!(environment = %current, "active environment set");
    } else {
      debug!(environment = %current, "active environment set again with the same name");
    }

    Ok(current)
  }

  /// Set the active environment from a process variable, if it is present
  /// and non-empty. Returns the active environment, if any.
  pub fn from_env_var(&self, var: &str) -> Result<Option<&Environment>, EnvError> {
    match std::env::var(var) {
      Ok(value) if !value.trim().is_empty() => self.set_active(value.trim()).map(Some),
      _ => Ok(self.active.get()),
    }
  }

  /// The active environment.
  pub fn active(&self) -> Result<&Environment, EnvError> {
    self.active.get().ok_or(EnvError::NotInitialized)
  }

  /// Whether `env` may be made active on this registry.
  pub fn is_known(&self, env: &Environment) -> bool {
    self.known.is_empty() || self.known.contains(env)
  }

  /// Known environment names, sorted. Empty when the registry is open.
  pub fn known(&self) -> impl Iterator<Item = &Environment> {
    self.known.iter()
  }
}
