//! Cadence Compiler
//!
//! Turns a [`Workflow`](cadence_workflow::Workflow) into a
//! [`CompiledWorkflow`]: a validated, topologically ordered node set bound to
//! one environment, with each node's retry policy and resolved configs, plus
//! the schedule interval and first start time.
//!
//! Compilation is all-or-nothing. Any error aborts it and no artifact is
//! produced.
//!
//! # Usage
//!
//! ```ignore
//! use cadence_compiler::{Compiler, GraphCompiler};
//!
//! let compiled = GraphCompiler::new().compile(&workflow, &env, Utc::now())?;
//! println!("{}", serde_json::to_string_pretty(&compiled)?);
//! ```

mod artifact;
mod compiler;
mod error;
mod load;

pub use artifact::{CompiledNode, CompiledWorkflow};
pub use compiler::{Compiler, GraphCompiler};
pub use error::CompileError;
pub use load::{config_from_def, workflow_from_def};
