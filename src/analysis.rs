//! Deterministic aggregation of logged exercises
//!
//! Normalizes the loosely-typed exercise fields, then folds a set of exercises into a
//! tipo -> area -> ejercicio tree of minutes and percentages. Plan comparison lives in
//! `comparison`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::LoggedExercise;

/// Label used when a tipo, area or exercise name is missing
pub const UNNAMED: &str = "Sin nombre";

/// Minutes are summed as integer thousandths so the result does not depend on input order
const MILLIS_PER_MINUTE: f64 = 1000.0;

/// Upper bound for a single exercise (one day); larger values are data-entry errors
pub const MAX_EXERCISE_MINUTES: f64 = 24.0 * 60.0;

/// ---------------------------------------------------------------------------
/// Exercise Normalizer
/// ---------------------------------------------------------------------------

/// Parse a free-text quantity ("20m", "30 reps", "1.5 min") into minutes.
///
/// Every character that is not an ASCII digit or `.` is dropped before parsing, so
/// anything unparsable (including an empty string) yields `0.0`.
pub fn parse_minutes(tiempo_cantidad: &str) -> f64 {
  let numeric: String = tiempo_cantidad
    .chars()
    .filter(|c| c.is_ascii_digit() || *c == '.')
    .collect();

  match numeric.parse::<f64>() {
    Ok(minutes) if minutes.is_finite() => minutes,
    _ => 0.0,
  }
}

/// Canonical key for a tipo/area/exercise value: whitespace-separated tokens title-cased
/// and joined by single spaces.
pub fn canonical_key(raw: &str) -> String {
  let key = raw
    .split_whitespace()
    .map(title_case)
    .collect::<Vec<_>>()
    .join(" ");

  if key.is_empty() {
    UNNAMED.to_string()
  } else {
    key
  }
}

fn title_case(token: &str) -> String {
  let mut chars = token.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    None => String::new(),
  }
}

/// Display label of an exercise: the specific name when given, else the generic one
pub fn exercise_label(exercise: &LoggedExercise) -> String {
  let specific = exercise
    .ejercicio_especifico
    .as_deref()
    .filter(|s| !s.trim().is_empty());

  canonical_key(specific.unwrap_or(&exercise.ejercicio))
}

fn to_millis(minutes: f64) -> u64 {
  (minutes * MILLIS_PER_MINUTE).round() as u64
}

fn to_minutes(millis: u64) -> f64 {
  millis as f64 / MILLIS_PER_MINUTE
}

fn percentage(part: u64, total: u64) -> f64 {
  if total == 0 {
    0.0
  } else {
    part as f64 / total as f64 * 100.0
  }
}

/// ---------------------------------------------------------------------------
/// Time Aggregator
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeStats {
  pub total_minutes: f64,
  pub type_stats: BTreeMap<String, TypeStat>,
  /// Area totals merged across every tipo
  pub area_stats: BTreeMap<String, AreaTotal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStat {
  pub total: f64,
  pub percentage: f64,
  pub areas: BTreeMap<String, AreaStat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaStat {
  pub total: f64,
  pub percentage: f64,
  /// Exercise label -> minutes
  pub exercises: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaTotal {
  pub total: f64,
  pub percentage: f64,
}

type MinuteTree = BTreeMap<String, BTreeMap<String, BTreeMap<String, u64>>>;

/// Fold exercises into per-tipo, per-area and per-exercise minutes.
///
/// Exercises whose quantity parses to zero are skipped entirely.
pub fn aggregate<'a, I>(exercises: I) -> TimeStats
where
  I: IntoIterator<Item = &'a LoggedExercise>,
{
  let mut tree: MinuteTree = BTreeMap::new();
  let mut total: u64 = 0;
  let mut counted = 0usize;
  let mut skipped = 0usize;

  for exercise in exercises {
    let mut minutes = parse_minutes(&exercise.tiempo_cantidad);
    if minutes > MAX_EXERCISE_MINUTES {
      tracing::warn!(
        exercise_id = %exercise.id,
        tiempo_cantidad = %exercise.tiempo_cantidad,
        "exercise duration capped at one day"
      );
      minutes = MAX_EXERCISE_MINUTES;
    }
    let millis = to_millis(minutes);
    if millis == 0 {
      skipped += 1;
      continue;
    }

    total = total.saturating_add(millis);
    counted += 1;

    let bucket = tree
      .entry(canonical_key(&exercise.tipo))
      .or_default()
      .entry(canonical_key(&exercise.area))
      .or_default()
      .entry(exercise_label(exercise))
      .or_default();
    *bucket = bucket.saturating_add(millis);
  }

  tracing::debug!(counted, skipped, total_minutes = to_minutes(total), "aggregated exercises");

  let mut area_millis: BTreeMap<String, u64> = BTreeMap::new();
  let mut type_stats = BTreeMap::new();

  for (tipo, areas) in tree {
    let mut type_total: u64 = 0;
    let mut area_map = BTreeMap::new();

    for (area, exercises) in areas {
      let area_total: u64 = exercises.values().fold(0, |acc, m| acc.saturating_add(*m));
      type_total = type_total.saturating_add(area_total);

      let merged = area_millis.entry(area.clone()).or_default();
      *merged = merged.saturating_add(area_total);

      area_map.insert(
        area,
        AreaStat {
          total: to_minutes(area_total),
          percentage: percentage(area_total, total),
          exercises: exercises
            .into_iter()
            .map(|(name, m)| (name, to_minutes(m)))
            .collect(),
        },
      );
    }

    type_stats.insert(
      tipo,
      TypeStat {
        total: to_minutes(type_total),
        percentage: percentage(type_total, total),
        areas: area_map,
      },
    );
  }

  let area_stats = area_millis
    .into_iter()
    .map(|(area, m)| {
      (
        area,
        AreaTotal {
          total: to_minutes(m),
          percentage: percentage(m, total),
        },
      )
    })
    .collect();

  TimeStats {
    total_minutes: to_minutes(total),
    type_stats,
    area_stats,
  }
}

impl TimeStats {
  pub fn is_empty(&self) -> bool {
    self.type_stats.is_empty()
  }

  /// Share of all logged minutes spent on one exercise, 0 when unknown
  pub fn exercise_percentage(&self, tipo: &str, area: &str, exercise: &str) -> f64 {
    if self.total_minutes <= 0.0 {
      return 0.0;
    }
    self
      .type_stats
      .get(tipo)
      .and_then(|t| t.areas.get(area))
      .and_then(|a| a.exercises.get(exercise))
      .map(|minutes| minutes / self.total_minutes * 100.0)
      .unwrap_or(0.0)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
