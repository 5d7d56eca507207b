use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A multi-environment config as written in a definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDef {
  pub name: String,
  /// Environment used when none is active.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_environment: Option<String>,
  /// Values shared by every environment unless overridden.
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub defaults: Map<String, Value>,
  /// Per-environment values, in declaration order.
  pub environments: Vec<EnvironmentValuesDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentValuesDef {
  pub environment: String,
  #[serde(default)]
  pub values: Map<String, Value>,
}
