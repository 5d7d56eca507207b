use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cadence_compiler::{Compiler, GraphCompiler, config_from_def, workflow_from_def};
use cadence_config::{WorkflowDef, load_definition};
use cadence_env::{ENV_VAR, Environment, EnvironmentRegistry, Params};
use cadence_workflow::Workflow;

/// Prefix of process variables that override config parameters.
const PARAM_VAR_PREFIX: &str = "CADENCE_PARAM_";

/// Cadence - compiles multi-environment workflow definitions into scheduler-ready graphs
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Active environment (default: $CADENCE_ENV)
  #[arg(long, global = true)]
  env: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a workflow and print the artifact as JSON
  Compile {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,

    /// Compile as of this RFC 3339 instant instead of now
    #[arg(long)]
    now: Option<DateTime<Utc>>,
  },

  /// Print the order in which a workflow's jobs run
  Order {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,
  },

  /// Inspect multi-environment configs
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

#[derive(Subcommand)]
enum ConfigCommand {
  /// Print a config resolved for the active (or its default) environment
  Show {
    /// Path to the workflow file (JSON or YAML)
    workflow_file: PathBuf,

    /// Name of the config
    config: String,
  },
}

fn main() -> Result<()> {
  init_tracing();

  let cli = Cli::parse();

  let registry = EnvironmentRegistry::global();
  match cli.env {
    Some(env) => {
      registry.set_active(env)?;
    }
    None => {
      registry.from_env_var(ENV_VAR)?;
    }
  }

  match cli.command {
    Some(Commands::Compile { workflow_file, now }) => {
      compile(&workflow_file, registry, now.unwrap_or_else(Utc::now))?;
    }
    Some(Commands::Order { workflow_file }) => {
      order(&workflow_file)?;
    }
    Some(Commands::Config {
      command: ConfigCommand::Show {
        workflow_file,
        config,
      },
    }) => {
      show_config(&workflow_file, &config, registry)?;
    }
    None => {
      println!("cadence - use --help to see available commands");
    }
  }

  Ok(())
}

/// Log to stderr so stdout only carries command output.
fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn read_definition(workflow_file: &Path) -> Result<WorkflowDef> {
  load_definition(workflow_file)
    .with_context(|| format!("failed to load workflow file: {}", workflow_file.display()))
}

fn load_workflow(workflow_file: &Path) -> Result<Workflow> {
  let def = read_definition(workflow_file)?;
  let workflow = workflow_from_def(def)
    .with_context(|| format!("invalid workflow definition: {}", workflow_file.display()))?;
  info!(
    workflow_id = %workflow.workflow_id(),
    jobs = workflow.jobs().len(),
    "loaded workflow"
  );
  Ok(workflow)
}

fn compile(workflow_file: &Path, registry: &EnvironmentRegistry, now: DateTime<Utc>) -> Result<()> {
  let workflow = load_workflow(workflow_file)?;
  let env = registry
    .active()
    .with_context(|| format!("pass --env or set {ENV_VAR} to choose an environment"))?;

  let compiler = GraphCompiler::new().with_overrides(param_overrides());
  let compiled = compiler
    .compile(&workflow, env, now)
    .context("failed to compile workflow")?;

  println!("{}", serde_json::to_string_pretty(&compiled)?);
  Ok(())
}

fn order(workflow_file: &Path) -> Result<()> {
  let workflow = load_workflow(workflow_file)?;
  for job in workflow.sequential_order()? {
    println!("{}", job.id());
  }
  Ok(())
}

fn show_config(workflow_file: &Path, name: &str, registry: &EnvironmentRegistry) -> Result<()> {
  let def = read_definition(workflow_file)?;
  let config_def = def
    .configs
    .into_iter()
    .find(|c| c.name == name)
    .with_context(|| format!("config '{}' not found in {}", name, workflow_file.display()))?;
  let config = config_from_def(config_def)?;

  let env: Environment = match registry.active() {
    Ok(env) => env.clone(),
    Err(e) => config.default_environment().cloned().context(e)?,
  };

  let values = config.resolve_with_overrides(&env, &param_overrides())?;
  print!("{values}");
  Ok(())
}

/// Collect `CADENCE_PARAM_<name>` variables. Values that parse as JSON keep
/// their type; anything else is taken as a string.
fn param_overrides() -> Params {
  std::env::vars()
    .filter_map(|(key, value)| {
      let name = key.strip_prefix(PARAM_VAR_PREFIX)?.to_string();
      let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
      Some((name, value))
    })
    .collect()
}
