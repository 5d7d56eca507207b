use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::environment::Environment;
use crate::error::EnvError;

/// Parameter name to value mapping.
pub type Params = BTreeMap<String, Value>;

/// The parameter values of one config, bound to one environment.
///
/// Value sets are produced by [`MultiEnvConfig`](crate::MultiEnvConfig)
/// resolution and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigValueSet {
  config: String,
  environment: Environment,
  values: Params,
}

impl ConfigValueSet {
  pub(crate) fn new(config: impl Into<String>, environment: Environment, values: Params) -> Self {
    Self {
      config: config.into(),
      environment,
      values,
    }
  }

  /// Name of the config this set was resolved from.
  pub fn config_name(&self) -> &str {
    &self.config
  }

  pub fn environment(&self) -> &Environment {
    &self.environment
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.values.get(name)
  }

  /// Get a parameter if it is a string.
  pub fn get_str(&self, name: &str) -> Option<&str> {
    self.values.get(name).and_then(Value::as_str)
  }

  /// Get a parameter, failing with [`EnvError::MissingParameter`] when absent.
  pub fn require(&self, name: &str) -> Result<&Value, EnvError> {
    self
      .values
      .get(name)
      .ok_or_else(|| EnvError::MissingParameter {
        config: self.config.clone(),
        environment: self.environment.clone(),
        name: name.to_string(),
      })
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.values.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn values(&self) -> &Params {
    &self.values
  }
}

impl fmt::Display for ConfigValueSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{} [{}]", self.config, self.environment)?;
    for (name, value) in &self.values {
      match value {
        Value::String(s) => writeln!(f, "  {name} = {s}")?,
        other => writeln!(f, "  {name} = {other}")?,
      }
    }
    Ok(())
  }
}
