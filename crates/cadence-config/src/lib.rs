//! Cadence Config
//!
//! This crate contains the serializable workflow definition types for cadence.
//! These types describe a workflow before it is loaded into the authoring
//! model and compiled.
//!
//! Definitions can be read from:
//! - JSON files (`.json`)
//! - YAML files (`.yaml` / `.yml`)
//!
//! Job bodies cannot be expressed in a file. A file-defined job names a
//! `task` instead, which an external executor knows how to run.

mod config;
mod format;
mod job;
mod workflow;

pub use config::{ConfigDef, EnvironmentValuesDef};
pub use format::{DefinitionFormat, ParseError, load_definition, parse_definition};
pub use job::JobDef;
pub use workflow::WorkflowDef;
