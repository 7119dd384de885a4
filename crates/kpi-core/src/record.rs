//! Indicator records: the rows of the dashboard table.
//!
//! A record is what the user typed into the form: labels, an observation date,
//! and the numbers the status rule compares. Numeric cells are kept as
//! [`Measure`]s so a malformed value survives a load/save cycle untouched and
//! only degrades the row's status, never the whole table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{Error, Result};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Category of indicator. Has no effect on evaluation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum IndicatorKind {
  /// Key Performance Indicator.
  Kpi,
  /// Key Risk Indicator.
  Kri,
  /// Key Control Indicator.
  Kci,
}

// ─── Direction ───────────────────────────────────────────────────────────────

/// Which comparison rule judges `actual` against the target.
///
/// Labels are matched after normalisation (trimmed, lowercase, `_`/`-` read as
/// spaces), so `"Higher is Better"`, `"higher_is_better"` and
/// `" HIGHER-IS-BETTER "` are the same direction. Anything else is kept
/// verbatim in [`Direction::Other`] and evaluates to N/A.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
  HigherIsBetter,
  LowerIsBetter,
  Range,
  Other(String),
}

impl Direction {
  /// Parse a free-text direction label.
  pub fn parse_label(label: &str) -> Self {
    let normalized = label
      .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
      .filter(|part| !part.is_empty())
      .map(str::to_lowercase)
      .collect::<Vec<_>>()
      .join(" ");

    match normalized.as_str() {
      "higher is better" => Self::HigherIsBetter,
      "lower is better" => Self::LowerIsBetter,
      "range" => Self::Range,
      _ => Self::Other(label.to_owned()),
    }
  }

  /// The canonical label written to storage.
  pub fn label(&self) -> &str {
    match self {
      Self::HigherIsBetter => "Higher is Better",
      Self::LowerIsBetter => "Lower is Better",
      Self::Range => "Range",
      Self::Other(raw) => raw,
    }
  }
}

impl From<String> for Direction {
  fn from(label: String) -> Self { Self::parse_label(&label) }
}

impl From<Direction> for String {
  fn from(direction: Direction) -> Self { direction.label().to_owned() }
}

impl std::fmt::Display for Direction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

// ─── Measure ─────────────────────────────────────────────────────────────────

/// A numeric cell as it was entered: either a number or the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measure {
  Number(f64),
  Text(String),
}

impl Measure {
  /// The cell as a real number, if it is one. NaN counts as "not a number".
  pub fn as_number(&self) -> Option<f64> {
    let value = match self {
      Self::Number(n) => *n,
      Self::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    (!value.is_nan()).then_some(value)
  }

  /// Build a measure from a storage cell, keeping text that is not a number.
  pub fn from_cell(cell: &str) -> Self {
    match cell.trim().parse::<f64>() {
      Ok(n) if !n.is_nan() => Self::Number(n),
      _ => Self::Text(cell.to_owned()),
    }
  }
}

impl From<f64> for Measure {
  fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<&str> for Measure {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl std::fmt::Display for Measure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One monitored metric at one observation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
  pub kind:            Option<IndicatorKind>,
  /// Identity key for update and delete.
  pub name:            String,
  #[serde(default)]
  pub category:        String,
  #[serde(default)]
  pub unit_name:       String,
  #[serde(default)]
  pub owner:           String,
  pub observed_on:     Option<NaiveDate>,
  pub target:          Option<Measure>,
  pub actual:          Option<Measure>,
  #[serde(default)]
  pub unit_of_measure: String,
  pub notes:           Option<String>,
  /// `None` is read as [`Direction::HigherIsBetter`].
  pub direction:       Option<Direction>,
  pub target_min:      Option<Measure>,
  pub target_max:      Option<Measure>,
}

impl IndicatorRecord {
  /// A record with only a name; every other field empty.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      kind:            None,
      name:            name.into(),
      category:        String::new(),
      unit_name:       String::new(),
      owner:           String::new(),
      observed_on:     None,
      target:          None,
      actual:          None,
      unit_of_measure: String::new(),
      notes:           None,
      direction:       None,
      target_min:      None,
      target_max:      None,
    }
  }

  /// Reject records the table cannot key.
  pub fn validate(&self) -> Result<()> {
    if is_placeholder_name(&self.name) {
      return Err(Error::BlankName);
    }
    Ok(())
  }
}

/// True for names the table never keeps: blank, whitespace-only, or the
/// `nan` placeholder spreadsheet tools emit for empty cells.
pub fn is_placeholder_name(name: &str) -> bool {
  let trimmed = name.trim();
  trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A partial record for [`crate::table::Dataset::update`]. `None` leaves the
/// field as it is; the optional fields of the record use `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorPatch {
  pub kind:            Option<IndicatorKind>,
  pub name:            Option<String>,
  pub category:        Option<String>,
  pub unit_name:       Option<String>,
  pub owner:           Option<String>,
  pub observed_on:     Option<NaiveDate>,
  pub target:          Option<Measure>,
  pub actual:          Option<Measure>,
  pub unit_of_measure: Option<String>,
  #[serde(default, with = "double_option")]
  pub notes:           Option<Option<String>>,
  pub direction:       Option<Direction>,
  #[serde(default, with = "double_option")]
  pub target_min:      Option<Option<Measure>>,
  #[serde(default, with = "double_option")]
  pub target_max:      Option<Option<Measure>>,
}

impl IndicatorPatch {
  /// Overwrite the patched fields of `record`.
  pub fn apply_to(self, record: &mut IndicatorRecord) {
    if let Some(kind) = self.kind {
      record.kind = Some(kind);
    }
    if let Some(name) = self.name {
      record.name = name;
    }
    if let Some(category) = self.category {
      record.category = category;
    }
    if let Some(unit_name) = self.unit_name {
      record.unit_name = unit_name;
    }
    if let Some(owner) = self.owner {
      record.owner = owner;
    }
    if let Some(observed_on) = self.observed_on {
      record.observed_on = Some(observed_on);
    }
    if let Some(target) = self.target {
      record.target = Some(target);
    }
    if let Some(actual) = self.actual {
      record.actual = Some(actual);
    }
    if let Some(unit_of_measure) = self.unit_of_measure {
      record.unit_of_measure = unit_of_measure;
    }
    if let Some(notes) = self.notes {
      record.notes = notes;
    }
    if let Some(direction) = self.direction {
      record.direction = Some(direction);
    }
    if let Some(target_min) = self.target_min {
      record.target_min = target_min;
    }
    if let Some(target_max) = self.target_max {
      record.target_max = target_max;
    }
  }
}

/// Distinguishes an absent key (`None`) from an explicit `null`
/// (`Some(None)`).
mod double_option {
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  pub fn serialize<T, S>(
    value: &Option<Option<T>>,
    serializer: S,
  ) -> Result<S::Ok, S::Error>
  where
    T: Serialize,
    S: Serializer,
  {
    match value {
      Some(inner) => inner.serialize(serializer),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, T, D>(
    deserializer: D,
  ) -> Result<Option<Option<T>>, D::Error>
  where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
  {
    Option::<T>::deserialize(deserializer).map(Some)
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A row exactly as a storage backend hands it over: every cell optional text.
///
/// Conversion into an [`IndicatorRecord`] never fails; cells that do not parse
/// are kept as text or dropped to `None`, and the evaluator turns them into
/// N/A.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
  pub kind:            Option<String>,
  pub name:            Option<String>,
  pub category:        Option<String>,
  pub unit_name:       Option<String>,
  pub owner:           Option<String>,
  pub observed_on:     Option<String>,
  pub target:          Option<String>,
  pub actual:          Option<String>,
  pub unit_of_measure: Option<String>,
  pub notes:           Option<String>,
  pub direction:       Option<String>,
  pub target_min:      Option<String>,
  pub target_max:      Option<String>,
  /// Status as some earlier writer computed it. Never trusted on load.
  pub status:          Option<String>,
}

impl RawRow {
  /// Whether the table should keep this row at all.
  pub fn has_usable_name(&self) -> bool {
    self.name.as_deref().is_some_and(|n| !is_placeholder_name(n))
  }

  /// Convert into a typed record, returning `None` for placeholder names.
  pub fn into_record(self) -> Option<IndicatorRecord> {
    if !self.has_usable_name() {
      return None;
    }

    let kind = self
      .kind
      .as_deref()
      .map(str::trim)
      .filter(|k| !k.is_empty())
      .and_then(|k| match k.parse::<IndicatorKind>() {
        Ok(kind) => Some(kind),
        Err(_) => {
          tracing::warn!(kind = k, "unrecognised indicator kind; loading without one");
          None
        }
      });

    Some(IndicatorRecord {
      kind,
      name: self.name.unwrap_or_default().trim().to_owned(),
      category: self.category.unwrap_or_default(),
      unit_name: self.unit_name.unwrap_or_default(),
      owner: self.owner.unwrap_or_default(),
      observed_on: self.observed_on.as_deref().and_then(parse_date),
      target: non_blank(self.target).map(|c| Measure::from_cell(&c)),
      actual: non_blank(self.actual).map(|c| Measure::from_cell(&c)),
      unit_of_measure: self.unit_of_measure.unwrap_or_default(),
      notes: non_blank(self.notes),
      direction: non_blank(self.direction).map(Direction::from),
      target_min: non_blank(self.target_min).map(|c| Measure::from_cell(&c)),
      target_max: non_blank(self.target_max).map(|c| Measure::from_cell(&c)),
    })
  }
}

fn non_blank(cell: Option<String>) -> Option<String> {
  cell.filter(|c| !c.trim().is_empty())
}

/// Parse an observation date. Accepts `YYYY-MM-DD`, optionally followed by a
/// time part, which is discarded. Anything else is treated as missing.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
  let cell = cell.trim();
  let date_part = cell.get(..10).unwrap_or(cell);
  NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
