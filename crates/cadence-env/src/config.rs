use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use crate::environment::{Environment, EnvironmentRegistry};
use crate::error::EnvError;
use crate::values::{ConfigValueSet, Params};

/// A named configuration with one value set per environment.
///
/// All environments are declared together and resolved to exactly one
/// [`ConfigValueSet`] at use time. Every environment must expose the same
/// parameter names (after applying shared defaults); this is checked as each
/// environment is added.
///
/// String values may reference the environment name as `{{ env }}`, which is
/// substituted during resolution. Any other text is returned as added.
#[derive(Debug, Clone)]
pub struct MultiEnvConfig {
  name: String,
  defaults: Params,
  default_environment: Option<Environment>,
  /// Raw per-environment values, in declaration order.
  environments: Vec<(Environment, Params)>,
}

impl MultiEnvConfig {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      defaults: Params::new(),
      default_environment: None,
      environments: Vec::new(),
    }
  }

  /// Values inherited by every environment that does not set them itself.
  pub fn with_defaults(mut self, values: Value) -> Result<Self, EnvError> {
    self.defaults = self.to_params(&Environment::from("*"), values)?;
    Ok(self)
  }

  /// Environment used by [`resolve_active`](Self::resolve_active) when the
  /// registry has no active environment.
  pub fn with_default_environment(mut self, env: impl Into<Environment>) -> Self {
    self.default_environment = Some(env.into());
    self
  }

  /// Register the parameter values for `env`.
  pub fn add_configuration(
    mut self,
    env: impl Into<Environment>,
    values: Value,
  ) -> Result<Self, EnvError> {
    let env = env.into();
    let params = self.to_params(&env, values)?;

    if self.has_environment(&env) {
      return Err(EnvError::DuplicateEnvironment {
        config: self.name.clone(),
        environment: env,
      });
    }

    if let Some((_, first)) = self.environments.first() {
      let expected = self.effective_keys(first);
      let actual = self.effective_keys(&params);
      if expected != actual {
        return Err(EnvError::SchemaMismatch {
          config: self.name.clone(),
          environment: env,
          missing: expected.difference(&actual).cloned().collect(),
          unexpected: actual.difference(&expected).cloned().collect(),
        });
      }
    }

    debug!(config = %self.name, environment = %env, params = params.len(), "configuration added");
    self.environments.push((env, params));
    Ok(self)
  }

  /// Resolve the value set for `env`.
  pub fn resolve(&self, env: &Environment) -> Result<ConfigValueSet, EnvError> {
    self.resolve_with_overrides(env, &Params::new())
  }

  /// Resolve the value set for `env`, replacing parameters named in
  /// `overrides`. Overrides for parameters outside the schema are ignored.
  pub fn resolve_with_overrides(
    &self,
    env: &Environment,
    overrides: &Params,
  ) -> Result<ConfigValueSet, EnvError> {
    let (_, values) = self
      .environments
      .iter()
      .find(|(name, _)| name == env)
      .ok_or_else(|| EnvError::UnknownEnvironment {
        config: self.name.clone(),
        environment: env.clone(),
        known: self.environments().cloned().collect(),
      })?;

    let mut effective = self.defaults.clone();
    effective.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));

    for (name, value) in overrides {
      if let Some(slot) = effective.get_mut(name) {
        debug!(config = %self.name, param = %name, "parameter overridden");
        *slot = value.clone();
      }
    }

    let rendered = effective
      .into_iter()
      .map(|(name, value)| (name, substitute_env(env, value)))
      .collect();

    Ok(ConfigValueSet::new(&self.name, env.clone(), rendered))
  }

  /// Resolve against the registry's active environment, falling back to the
  /// default environment when the registry was never initialized.
  pub fn resolve_active(&self, registry: &EnvironmentRegistry) -> Result<ConfigValueSet, EnvError> {
    match (registry.active(), &self.default_environment) {
      (Ok(env), _) => self.resolve(env),
      (Err(EnvError::NotInitialized), Some(default)) => self.resolve(default),
      (Err(e), _) => Err(e),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn default_environment(&self) -> Option<&Environment> {
    self.default_environment.as_ref()
  }

  /// Registered environments in declaration order.
  pub fn environments(&self) -> impl Iterator<Item = &Environment> {
    self.environments.iter().map(|(env, _)| env)
  }

  pub fn has_environment(&self, env: &Environment) -> bool {
    self.environments.iter().any(|(name, _)| name == env)
  }

  /// Parameter names every environment resolves to, sorted.
  pub fn schema(&self) -> Vec<String> {
    match self.environments.first() {
      Some((_, first)) => self.effective_keys(first).into_iter().collect(),
      None => self.defaults.keys().cloned().collect(),
    }
  }

  fn effective_keys(&self, params: &Params) -> BTreeSet<String> {
    self.defaults.keys().chain(params.keys()).cloned().collect()
  }

  fn to_params(&self, env: &Environment, values: Value) -> Result<Params, EnvError> {
    match values {
      Value::Object(map) => Ok(map.into_iter().collect()),
      _ => Err(EnvError::InvalidParameters {
        config: self.name.clone(),
        environment: env.clone(),
      }),
    }
  }
}

const ENV_PLACEHOLDERS: [&str; 2] = ["{{ env }}", "{{env}}"];

/// Replace the environment placeholder in every string nested inside `value`.
fn substitute_env(env: &Environment, value: Value) -> Value {
  match value {
    Value::String(s) => Value::String(
      ENV_PLACEHOLDERS
        .into_iter()
        .fold(s, |s, placeholder| s.replace(placeholder, env.as_str())),
    ),
    Value::Array(items) => Value::Array(
      items
        .into_iter()
        .map(|item| substitute_env(env, item))
        .collect(),
    ),
    Value::Object(map) => Value::Object(
      map
        .into_iter()
        .map(|(k, v)| (k, substitute_env(env, v)))
        .collect(),
    ),
    other => other,
  }
}
