use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

const HOUR_SECS: i64 = 60 * 60;
const DAY_SECS: i64 = 24 * HOUR_SECS;

/// How often a compiled workflow is triggered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScheduleInterval {
  Hourly,
  #[default]
  Daily,
  /// A cron expression with 5, 6 or 7 fields.
  Cron(String),
  /// Only triggered by hand.
  Manual,
}

impl ScheduleInterval {
  pub fn cron(expr: impl Into<String>) -> Result<Self, WorkflowError> {
    let expr = expr.into();
    cron_schedule(&expr)?;
    Ok(Self::Cron(expr))
  }

  pub fn is_manual(&self) -> bool {
    matches!(self, Self::Manual)
  }
}

impl FromStr for ScheduleInterval {
  type Err = WorkflowError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
      "@hourly" | "hourly" => Ok(Self::Hourly),
      "@daily" | "daily" => Ok(Self::Daily),
      "" | "manual" | "@once" | "none" => Ok(Self::Manual),
      _ => Self::cron(s),
    }
  }
}

impl TryFrom<String> for ScheduleInterval {
  type Error = WorkflowError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<ScheduleInterval> for String {
  fn from(interval: ScheduleInterval) -> Self {
    interval.to_string()
  }
}

impl fmt::Display for ScheduleInterval {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Hourly => f.write_str("@hourly"),
      Self::Daily => f.write_str("@daily"),
      Self::Cron(expr) => f.write_str(expr),
      Self::Manual => f.write_str("manual"),
    }
  }
}

/// Parse a cron expression.
///
/// Five-field expressions are standard cron: they get a zero seconds field
/// and their day-of-week field is renumbered from 0 = Sunday to the `cron`
/// crate's 1 = Sunday. Six and seven fields are passed through as is.
fn cron_schedule(expr: &str) -> Result<cron::Schedule, WorkflowError> {
  let invalid = |message: String| WorkflowError::InvalidSchedule {
    schedule: expr.to_string(),
    message,
  };

  let fields: Vec<&str> = expr.split_whitespace().collect();
  let normalized = match fields.as_slice() {
    [minute, hour, day, month, weekday] => {
      let weekday = shift_day_of_week(weekday)
        .ok_or_else(|| invalid(format!("invalid day-of-week field '{weekday}'")))?;
      format!("0 {minute} {hour} {day} {month} {weekday}")
    }
    _ => expr.to_string(),
  };
  cron::Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))
}

/// Rewrite a standard day-of-week field (0 or 7 = Sunday) as an explicit
/// list in 1 = Sunday numbering. Named days and `*`/`?` pass through.
fn shift_day_of_week(field: &str) -> Option<String> {
  if field == "*" || field == "?" {
    return Some(field.to_string());
  }

  let mut named = Vec::new();
  let mut days = BTreeSet::new();
  for item in field.split(',') {
    if item.chars().any(|c| c.is_ascii_alphabetic()) {
      named.push(item.to_string());
      continue;
    }

    let (range, step) = match item.split_once('/') {
      Some((range, step)) => (range, step.parse::<usize>().ok().filter(|s| *s > 0)?),
      None => (item, 1),
    };
    let (first, last) = match range.split_once('-') {
      _ if range == "*" => (0, 6),
      Some((first, last)) => (first.parse::<u32>().ok()?, last.parse::<u32>().ok()?),
      None if step > 1 => (range.parse::<u32>().ok()?, 7),
      None => {
        let day = range.parse::<u32>().ok()?;
        (day, day)
      }
    };
    if first > last || last > 7 {
      return None;
    }
    days.extend((first..=last).step_by(step).map(|day| day % 7 + 1));
  }

  named.extend(days.into_iter().map(|day| day.to_string()));
  Some(named.join(","))
}

type StartTimeFn = dyn Fn(DateTime<Utc>, &ScheduleInterval) -> Option<DateTime<Utc>> + Send + Sync;

/// Computes the first trigger instant of a workflow from "now".
#[derive(Clone, Default)]
pub enum StartTimeRule {
  /// See [`aligned_start`].
  #[default]
  Aligned,
  Custom(Arc<StartTimeFn>),
}

impl StartTimeRule {
  pub fn custom<F>(f: F) -> Self
  where
    F: Fn(DateTime<Utc>, &ScheduleInterval) -> Option<DateTime<Utc>> + Send + Sync + 'static,
  {
    Self::Custom(Arc::new(f))
  }

  /// First trigger instant, or `None` for workflows that are not scheduled.
  pub fn first_start(
    &self,
    now: DateTime<Utc>,
    interval: &ScheduleInterval,
  ) -> Result<Option<DateTime<Utc>>, WorkflowError> {
    match self {
      Self::Aligned => aligned_start(now, interval),
      Self::Custom(f) => Ok(f(now, interval)),
    }
  }
}

impl fmt::Debug for StartTimeRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Aligned => f.write_str("Aligned"),
      Self::Custom(_) => f.write_str("Custom(..)"),
    }
  }
}

/// The earliest interval boundary at or after `now`, in UTC.
///
/// - hourly: the top of the hour
/// - daily: midnight
/// - cron: the next fire time
/// - manual: none
pub fn aligned_start(
  now: DateTime<Utc>,
  interval: &ScheduleInterval,
) -> Result<Option<DateTime<Utc>>, WorkflowError> {
  let out_of_range = || WorkflowError::StartTimeOutOfRange {
    schedule: interval.to_string(),
  };

  match interval {
    ScheduleInterval::Hourly => ceil_to(now, HOUR_SECS).map(Some).ok_or_else(out_of_range),
    ScheduleInterval::Daily => ceil_to(now, DAY_SECS).map(Some).ok_or_else(out_of_range),
    ScheduleInterval::Cron(expr) => {
      let schedule = cron_schedule(expr)?;
      // `after` is exclusive, so step back one second when `now` sits on a
      // whole second that may itself be a fire time.
      let whole = now.trunc_subsecs(0);
      let base = if whole == now {
        whole - TimeDelta::seconds(1)
      } else {
        whole
      };
      Ok(schedule.after(&base).next())
    }
    ScheduleInterval::Manual => Ok(None),
  }
}

fn ceil_to(now: DateTime<Utc>, step_secs: i64) -> Option<DateTime<Utc>> {
  let secs = now.timestamp();
  let rem = secs.rem_euclid(step_secs);
  if rem == 0 && now.timestamp_subsec_nanos() == 0 {
    return Some(now);
  }
  DateTime::from_timestamp(secs - rem + step_secs, 0)
}
