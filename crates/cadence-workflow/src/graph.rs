use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::WorkflowError;

/// A validated job dependency graph.
///
/// Built from `(job_id, upstream_ids)` pairs. Construction fails on duplicate
/// ids, cycles and references to unknown jobs, so every `Graph` is acyclic
/// and fully referenced.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Job ids, every job after all of its upstreams.
  order: Vec<String>,
  /// Adjacency list: job_id -> list of downstream job_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: job_id -> list of upstream job_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Jobs with no upstreams, in declaration order.
  entry_points: Vec<String>,
  /// Jobs with more than one upstream.
  join_points: HashSet<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Visiting,
  Done,
}

impl Graph {
  /// Validate and build a graph from jobs in declaration order.
  pub fn build<'a, I>(jobs: I) -> Result<Self, WorkflowError>
  where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
  {
    let jobs: Vec<(&str, &[String])> = jobs.into_iter().collect();

    let mut upstream: HashMap<&str, &[String]> = HashMap::with_capacity(jobs.len());
    for (id, deps) in &jobs {
      if upstream.insert(*id, *deps).is_some() {
        debug!(job_id = %id, "duplicate job id");
        return Err(WorkflowError::DuplicateJob {
          job_id: id.to_string(),
        });
      }
    }

    // Depth-first over upstream edges; a job is emitted once all of its
    // upstreams have been. Unknown ids are skipped here and reported below.
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(jobs.len());
    let mut order: Vec<String> = Vec::with_capacity(jobs.len());
    for (id, _) in &jobs {
      visit(*id, &upstream, &mut marks, &mut order)?;
    }

    for (id, deps) in &jobs {
      if let Some(missing) = deps.iter().find(|d| !upstream.contains_key(d.as_str())) {
        debug!(job_id = %id, dependency = %missing, "unknown upstream job");
        return Err(WorkflowError::UnknownDependency {
          job_id: id.to_string(),
          dependency: missing.clone(),
        });
      }
    }

    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();
    for (id, deps) in &jobs {
      adjacency.entry(id.to_string()).or_default();
      reverse_adjacency.insert(id.to_string(), deps.to_vec());
      for dep in deps.iter() {
        adjacency.entry(dep.clone()).or_default().push(id.to_string());
      }
    }

    let entry_points = jobs
      .iter()
      .filter(|(_, deps)| deps.is_empty())
      .map(|(id, _)| id.to_string())
      .collect();

    let join_points = jobs
      .iter()
      .filter(|(_, deps)| deps.len() > 1)
      .map(|(id, _)| id.to_string())
      .collect();

    Ok(Self {
      order,
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
    })
  }

  /// Job ids in topological order.
  pub fn order(&self) -> &[String] {
    &self.order
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// Jobs that can start as soon as the workflow is triggered.
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Jobs that wait on `job_id`. Empty for unknown ids.
  pub fn downstream(&self, job_id: &str) -> &[String] {
    self
      .adjacency
      .get(job_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Jobs `job_id` waits on, as declared.
  pub fn upstream(&self, job_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(job_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Whether `job_id` waits on more than one job.
  pub fn is_join_point(&self, job_id: &str) -> bool {
    self.join_points.contains(job_id)
  }

  pub fn join_points(&self) -> &HashSet<String> {
    &self.join_points
  }
}

/// Emit `root` and everything it transitively waits on into `order`,
/// upstreams first. Uses an explicit stack so chain depth is unbounded.
fn visit<'a>(
  root: &'a str,
  upstream: &HashMap<&'a str, &'a [String]>,
  marks: &mut HashMap<&'a str, Mark>,
  order: &mut Vec<String>,
) -> Result<(), WorkflowError> {
  if marks.contains_key(root) {
    return Ok(());
  }
  let Some(deps) = upstream.get(root).copied() else {
    return Ok(());
  };

  // Frames are (job id, its upstreams, index of the next upstream to visit).
  // The ids on the stack are exactly the jobs marked `Visiting`.
  let mut stack: Vec<(&'a str, &'a [String], usize)> = vec![(root, deps, 0)];
  marks.insert(root, Mark::Visiting);

  while let Some(frame) = stack.last_mut() {
    let (id, deps) = (frame.0, frame.1);
    let Some(dep) = deps.get(frame.2) else {
      marks.insert(id, Mark::Done);
      order.push(id.to_string());
      stack.pop();
      continue;
    };
    frame.2 += 1;

    let dep = dep.as_str();
    match marks.get(dep) {
      Some(Mark::Done) => {}
      Some(Mark::Visiting) => {
        let start = stack.iter().position(|(p, _, _)| *p == dep).unwrap_or(0);
        let mut cycle: Vec<String> = stack[start..].iter().map(|(p, _, _)| p.to_string()).collect();
        cycle.push(dep.to_string());
        debug!(cycle = %cycle.join(" -> "), "dependency cycle");
        return Err(WorkflowError::CyclicDependency { cycle });
      }
      None => {
        if let Some(dep_deps) = upstream.get(dep).copied() {
          marks.insert(dep, Mark::Visiting);
          stack.push((dep, dep_deps, 0));
        }
      }
    }
  }

  Ok(())
}
