//! The status rule: judge one record as Green, Red or N/A.
//!
//! Evaluation is fail-soft. A cell that does not parse as a number turns the
//! row N/A; nothing here returns an error, so one malformed row can never
//! abort a pass over the whole table.

use serde::{Deserialize, Serialize};

use crate::record::{Direction, IndicatorRecord, Measure};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Outcome of evaluating a record. Never stored; always recomputed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  Green,
  Red,
  NotApplicable,
}

impl Status {
  pub const ALL: [Status; 3] = [Status::Green, Status::Red, Status::NotApplicable];

  /// Display label, also written to the derived `status` storage column.
  pub fn label(self) -> &'static str {
    match self {
      Self::Green => "Green",
      Self::Red => "Red",
      Self::NotApplicable => "N/A",
    }
  }

  /// Heatmap weight: Green 1, Red 0, N/A halfway.
  pub fn score(self) -> f64 {
    match self {
      Self::Green => 1.0,
      Self::Red => 0.0,
      Self::NotApplicable => 0.5,
    }
  }
}

impl std::fmt::Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

// ─── Rule ────────────────────────────────────────────────────────────────────

/// A direction with its thresholds already parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
  /// Higher is better: green at or above the target.
  AtLeast(f64),
  /// Lower is better: green at or below the target.
  AtMost(f64),
  /// Green inside the closed interval. `min > max` is never green.
  Within { min: f64, max: f64 },
}

impl Rule {
  /// Derive the rule for `record`, or `None` when its direction is
  /// unrecognised or a threshold it needs is not a number.
  pub fn for_record(record: &IndicatorRecord) -> Option<Self> {
    match record.direction.as_ref().unwrap_or(&Direction::HigherIsBetter) {
      Direction::HigherIsBetter => number(&record.target).map(Self::AtLeast),
      Direction::LowerIsBetter => number(&record.target).map(Self::AtMost),
      Direction::Range => Some(Self::Within {
        min: number(&record.target_min)?,
        max: number(&record.target_max)?,
      }),
      Direction::Other(_) => None,
    }
  }

  pub fn judge(self, actual: f64) -> Status {
    let green = match self {
      Self::AtLeast(target) => actual >= target,
      Self::AtMost(target) => actual <= target,
      Self::Within { min, max } => min <= actual && actual <= max,
    };
    if green { Status::Green } else { Status::Red }
  }
}

fn number(cell: &Option<Measure>) -> Option<f64> {
  cell.as_ref().and_then(Measure::as_number)
}

// ─── Evaluator ───────────────────────────────────────────────────────────────

/// Classify one record.
///
/// `actual` is checked first: when it is not a number the result is N/A and
/// no other field is consulted.
pub fn evaluate(record: &IndicatorRecord) -> Status {
  let Some(actual) = number(&record.actual) else {
    return Status::NotApplicable;
  };
  Rule::for_record(record)
    .map(|rule| rule.judge(actual))
    .unwrap_or(Status::NotApplicable)
}
