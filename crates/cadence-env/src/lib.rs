//! Cadence Env
//!
//! This crate lets one named configuration carry different parameter values
//! per deployment environment and resolve to exactly one value set at use time.
//!
//! - [`Environment`]: an opaque environment name ("dev", "prod", ...)
//! - [`EnvironmentRegistry`]: the active environment for a process
//! - [`ConfigValueSet`]: an immutable parameter mapping bound to one environment
//! - [`MultiEnvConfig`]: one value set per environment under a shared schema
//!
//! # Usage
//!
//! ```
//! use cadence_env::{MultiEnvConfig, Environment};
//! use serde_json::json;
//!
//! let config = MultiEnvConfig::new("dataset")
//!   .add_configuration("dev", json!({ "table": "t_dev" }))?
//!   .add_configuration("prod", json!({ "table": "t_prod" }))?;
//!
//! let values = config.resolve(&Environment::from("dev"))?;
//! assert_eq!(values.get_str("table"), Some("t_dev"));
//! # Ok::<(), cadence_env::EnvError>(())
//! ```

mod config;
mod environment;
mod error;
mod values;

pub use config::MultiEnvConfig;
pub use environment::{ENV_VAR, Environment, EnvironmentRegistry};
pub use error::EnvError;
pub use values::{ConfigValueSet, Params};
