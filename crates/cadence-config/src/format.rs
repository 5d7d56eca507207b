use std::path::Path;

use thiserror::Error;

use crate::workflow::WorkflowDef;

#[derive(Debug, Error)]
pub enum ParseError {
  #[error("failed to read definition file {path}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("unsupported definition file extension: {0}")]
  UnsupportedFormat(String),

  #[error("invalid JSON definition: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid YAML definition: {0}")]
  Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
  Json,
  Yaml,
}

impl DefinitionFormat {
  /// Pick the format from a file extension.
  pub fn from_path(path: &Path) -> Result<Self, ParseError> {
    let ext = path
      .extension()
      .and_then(|e| e.to_str())
      .map(str::to_ascii_lowercase)
      .unwrap_or_default();
    match ext.as_str() {
      "json" => Ok(Self::Json),
      "yaml" | "yml" => Ok(Self::Yaml),
      _ => Err(ParseError::UnsupportedFormat(path.display().to_string())),
    }
  }
}

/// Parse a workflow definition.
pub fn parse_definition(content: &str, format: DefinitionFormat) -> Result<WorkflowDef, ParseError> {
  match format {
    DefinitionFormat::Json => Ok(serde_json::from_str(content)?),
    DefinitionFormat::Yaml => Ok(serde_yaml::from_str(content)?),
  }
}

/// Read and parse a workflow definition file, picking the format from its
/// extension.
pub fn load_definition(path: &Path) -> Result<WorkflowDef, ParseError> {
  let format = DefinitionFormat::from_path(path)?;
  let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
    path: path.display().to_string(),
    source,
  })?;
  parse_definition(&content, format)
}
