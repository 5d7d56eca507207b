//! End-to-end compilation tests: definitions in, scheduler artifacts out.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_compiler::{CompileError, CompiledWorkflow, Compiler, GraphCompiler, workflow_from_def};
use cadence_config::{DefinitionFormat, parse_definition};
use cadence_env::{EnvError, Environment, MultiEnvConfig};
use cadence_workflow::{
  Job, JobContext, JobResult, ScheduleInterval, UnitOfWork, Workflow, WorkflowError,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::json;

fn noop(_ctx: &JobContext) -> JobResult {
  Ok(())
}

fn ten_fifteen() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap()
}

fn compile(workflow: &Workflow, env: &str) -> Result<CompiledWorkflow, CompileError> {
  GraphCompiler::new().compile(workflow, &Environment::from(env), ten_fifteen())
}

/// Every node appears after all of its upstreams.
fn assert_topological(compiled: &CompiledWorkflow) {
  let position: HashMap<&str, usize> = compiled
    .node_ids()
    .enumerate()
    .map(|(i, id)| (id, i))
    .collect();
  for node in &compiled.nodes {
    for upstream in &node.upstream {
      assert!(
        position[upstream.as_str()] < position[node.job_id.as_str()],
        "{} must come after {}",
        node.job_id,
        upstream
      );
    }
  }
}

#[test]
fn test_resolve_round_trips_every_environment() {
  let envs = ["dev", "test", "staging", "prod"];
  let config = envs.iter().fold(MultiEnvConfig::new("dataset"), |config, env| {
    config
      .add_configuration(*env, json!({ "project_id": format!("acme-{env}"), "shards": env.len() }))
      .unwrap()
  });

  for env in envs {
    let values = config.resolve(&Environment::from(env)).unwrap();
    assert_eq!(values.get("project_id"), Some(&json!(format!("acme-{env}"))));
    assert_eq!(values.get("shards"), Some(&json!(env.len())));
    assert_eq!(values.len(), 2);
  }

  assert!(matches!(
    config.resolve(&Environment::from("qa")),
    Err(EnvError::UnknownEnvironment { .. })
  ));
}

#[test]
fn test_dev_table_scenario() {
  let config = MultiEnvConfig::new("tables")
    .add_configuration("dev", json!({ "table": "t_dev" }))
    .unwrap()
    .add_configuration("prod", json!({ "table": "t_prod" }))
    .unwrap();

  let values = config.resolve(&Environment::from("dev")).unwrap();
  assert_eq!(values.values().len(), 1);
  assert_eq!(values.get("table"), Some(&json!("t_dev")));
}

#[test]
fn test_hourly_scenario() {
  let workflow = Workflow::new(
    "hourly",
    vec![
      Job::new("jobA", noop),
      Job::new("jobB", noop).depends_on(["jobA"]),
    ],
  )
  .with_schedule(ScheduleInterval::Hourly);

  let compiled = compile(&workflow, "dev").unwrap();
  assert_eq!(
    compiled.start_time,
    Some(Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap())
  );
  assert_eq!(compiled.node_ids().collect::<Vec<_>>(), vec!["jobA", "jobB"]);
}

#[test]
fn test_acyclic_graphs_compile_in_topological_order() {
  let diamond = Workflow::new(
    "diamond",
    vec![
      Job::new("report", noop).depends_on(["left", "right"]),
      Job::new("right", noop).depends_on(["root"]),
      Job::new("left", noop).depends_on(["root"]),
      Job::new("root", noop),
    ],
  );
  let wide = Workflow::new(
    "wide",
    (0..10)
      .map(|i| {
        let job = Job::new(format!("job{i}"), noop);
        if i == 0 { job } else { job.depends_on([format!("job{}", i / 2)]) }
      })
      .rev()
      .collect(),
  );
  let isolated = Workflow::new("isolated", vec![Job::new("a", noop), Job::new("b", noop)]);

  for workflow in [diamond, wide, isolated] {
    let compiled = compile(&workflow, "dev").unwrap();
    assert_eq!(compiled.nodes.len(), workflow.jobs().len());
    assert_topological(&compiled);

    let graph = compiled.graph().unwrap();
    assert!(!graph.entry_points().is_empty());
  }
}

#[test]
fn test_cycle_aborts_compile() {
  let workflow = Workflow::new(
    "cyclic",
    vec![
      Job::new("A", noop).depends_on(["C"]),
      Job::new("B", noop).depends_on(["A"]),
      Job::new("C", noop).depends_on(["B"]),
    ],
  );

  match compile(&workflow, "dev") {
    Err(CompileError::Workflow(WorkflowError::CyclicDependency { cycle })) => {
      for id in ["A", "B", "C"] {
        assert!(cycle.iter().any(|c| c == id), "cycle {cycle:?} is missing {id}");
      }
    }
    other => panic!("expected CyclicDependency, got {other:?}"),
  }
}

#[test]
fn test_unknown_dependency_names_missing_job() {
  let workflow = Workflow::new("dangling", vec![Job::new("jobX", noop).depends_on(["jobY"])]);

  let err = compile(&workflow, "dev").unwrap_err();
  assert!(err.to_string().contains("jobY"));
  assert!(matches!(
    err,
    CompileError::Workflow(WorkflowError::UnknownDependency { ref dependency, .. })
      if dependency == "jobY"
  ));
}

#[test]
fn test_retry_policy_binding() {
  assert!(matches!(
    noop.to_scheduled("job", -1, 60.0),
    Err(WorkflowError::InvalidRetryPolicy { .. })
  ));

  let job = noop.to_scheduled("job", 0, 60.0).unwrap();
  let compiled = compile(&Workflow::new("wf", vec![job]), "dev").unwrap();
  let node = compiled.get_node("job").unwrap();
  assert_eq!(node.retries, 0);
  assert_eq!(node.retry_policy().retries, 0);
}

#[test]
fn test_missing_environment_aborts_whole_compile() {
  let shared = Arc::new(
    MultiEnvConfig::new("dataset")
      .add_configuration("dev", json!({ "table": "t_dev" }))
      .unwrap(),
  );
  let prod_only = Arc::new(
    MultiEnvConfig::new("billing")
      .add_configuration("prod", json!({ "table": "b_prod" }))
      .unwrap(),
  );
  let workflow = Workflow::new(
    "wf",
    vec![
      Job::new("extract", noop).reads(Arc::clone(&shared)),
      Job::new("bill", noop)
        .depends_on(["extract"])
        .reads(prod_only),
    ],
  );

  match compile(&workflow, "dev") {
    Err(CompileError::Env(EnvError::UnknownEnvironment {
      config,
      environment,
      ..
    })) => {
      assert_eq!(config, "billing");
      assert_eq!(environment.as_str(), "dev");
    }
    other => panic!("expected UnknownEnvironment, got {other:?}"),
  }
}

#[test]
fn test_compile_is_deterministic() {
  let config = Arc::new(
    MultiEnvConfig::new("dataset")
      .add_configuration("dev", json!({ "table": "t_dev" }))
      .unwrap(),
  );
  let workflow = Workflow::new(
    "wf",
    vec![
      Job::new("c", noop).depends_on(["a", "b"]).reads(Arc::clone(&config)),
      Job::new("b", noop),
      Job::new("a", noop).reads(config),
    ],
  );

  let first = compile(&workflow, "dev").unwrap();
  let second = compile(&workflow, "dev").unwrap();
  assert_eq!(first, second);
}

#[test]
fn test_artifact_serializes_for_scheduler() {
  let workflow = Workflow::new(
    "wf",
    vec![Job::to_scheduled("a", noop, 2, 1.5).unwrap()],
  )
  .with_schedule(ScheduleInterval::Hourly);

  let compiled = compile(&workflow, "prod").unwrap();
  let value = serde_json::to_value(&compiled).unwrap();

  assert_eq!(value["workflow_id"], json!("wf"));
  assert_eq!(value["environment"], json!("prod"));
  assert_eq!(value["schedule_interval"], json!("@hourly"));
  assert_eq!(value["start_time"], json!("2024-03-01T11:00:00Z"));
  assert_eq!(value["nodes"][0]["retries"], json!(2));
  assert_eq!(value["nodes"][0]["retry_pause_ms"], json!(1500));

  let back: CompiledWorkflow = serde_json::from_value(value).unwrap();
  assert_eq!(back, compiled);
}

#[test]
fn test_manual_workflow_has_no_start_time() {
  let workflow =
    Workflow::new("wf", vec![Job::new("a", noop)]).with_schedule(ScheduleInterval::Manual);
  let compiled = compile(&workflow, "dev").unwrap();
  assert_eq!(compiled.start_time, None);
}

#[test]
fn test_job_context_from_artifact_runs_body() {
  let config = MultiEnvConfig::new("dataset")
    .add_configuration("dev", json!({ "table": "t_dev" }))
    .unwrap();
  let job = Job::new("load", |ctx: &JobContext| -> JobResult {
    let table = ctx
      .config("dataset")
      .ok_or("dataset config missing")?
      .require("table")?;
    if table == "t_dev" {
      Ok(())
    } else {
      Err(format!("unexpected table {table}").into())
    }
  })
  .reads(config);
  let workflow = Workflow::new("wf", vec![job]);

  let compiled = compile(&workflow, "dev").unwrap();
  let runtime = NaiveDate::from_ymd_opt(2024, 3, 1)
    .unwrap()
    .and_hms_opt(0, 0, 0)
    .unwrap();
  let ctx = compiled.job_context("load", runtime).unwrap();

  assert_eq!(ctx.environment.as_str(), "dev");
  assert_eq!(ctx.runtime_as_str, "2024-03-01 00:00:00");
  workflow.find_job("load").unwrap().execute(&ctx).unwrap();

  assert!(matches!(
    compiled.job_context("missing", runtime),
    Err(WorkflowError::JobNotFound(_))
  ));
}

#[test]
fn test_yaml_definition_compiles() {
  let def = parse_definition(
    r#"
workflow_id: events
schedule_interval: "@hourly"
configs:
  - name: dataset
    defaults:
      dataset: "analytics_{{ env }}"
    environments:
      - environment: dev
        values:
          table: t_dev
      - environment: prod
        values:
          table: t_prod
jobs:
  - job_id: load
    task: bq:load
    depends_on: [extract]
    configs: [dataset]
  - job_id: extract
    task: bq:extract
    retries: 0
"#,
    DefinitionFormat::Yaml,
  )
  .unwrap();

  let workflow = workflow_from_def(def).unwrap();
  let compiled = compile(&workflow, "prod").unwrap();

  assert_eq!(compiled.node_ids().collect::<Vec<_>>(), vec!["extract", "load"]);
  let load = compiled.get_node("load").unwrap();
  assert_eq!(load.task.as_deref(), Some("bq:load"));
  assert_eq!(load.configs["dataset"].get_str("table"), Some("t_prod"));
  assert_eq!(load.configs["dataset"].get_str("dataset"), Some("analytics_prod"));
  assert_eq!(compiled.get_node("extract").unwrap().retries, 0);
}
