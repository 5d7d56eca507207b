//! Cadence Workflow
//!
//! The authoring model for cadence: jobs with retry policies and upstream
//! dependencies, collected into a workflow with a schedule interval and a
//! start-time rule.
//!
//! Key pieces:
//! - [`Job`]: a unit of work bound to an id, a [`RetryPolicy`] and its upstream ids
//! - [`UnitOfWork`]: the contract an external executor invokes
//! - [`ScheduleInterval`] and [`StartTimeRule`]: cadence and first trigger instant
//! - [`Graph`]: the validated dependency graph and its topological order
//!
//! Retry policies are plain data here. Re-invoking a failed body is the
//! executor's job.

mod context;
mod error;
mod graph;
mod job;
mod retry;
mod schedule;
mod workflow;

pub use context::{JobContext, RUNTIME_FORMATS, parse_runtime};
pub use error::WorkflowError;
pub use graph::Graph;
pub use job::{Job, JobFailure, JobResult, TaskRef, UnitOfWork};
pub use retry::RetryPolicy;
pub use schedule::{ScheduleInterval, StartTimeRule, aligned_start};
pub use workflow::Workflow;
