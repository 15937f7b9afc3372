use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::canonical_key;
use crate::error::{AppError, Result};

/// Sibling percentages may exceed 100 by at most this much (float noise from the editor)
const PERCENT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPlan {
  pub id: String,
  pub jugador_id: String,
  pub academia_id: String,
  pub planificacion: Planificacion,
}

/// Coach-authored target distribution: tipo -> area -> ejercicio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Planificacion(pub BTreeMap<String, PlannedType>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedType {
  pub porcentaje_total: f64,
  #[serde(default)]
  pub areas: BTreeMap<String, PlannedArea>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedArea {
  pub porcentaje_del_total: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ejercicios: Option<BTreeMap<String, PlannedExercise>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedExercise {
  pub porcentaje_del_total: f64,
}

impl PlannedArea {
  /// No exercise breakdown means the coach left distribution among drills open
  pub fn is_free_distribution(&self) -> bool {
    self.ejercicios.as_ref().is_none_or(|e| e.is_empty())
  }
}

impl Planificacion {
  pub fn iter(&self) -> impl Iterator<Item = (&String, &PlannedType)> {
    self.0.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Check every percentage is within 0-100, every sibling set sums to at most 100 and
  /// no two siblings share a canonical name ("Canasto" and "canasto")
  pub fn validate(&self) -> Result<()> {
    check_siblings("planificacion", self.0.iter().map(|(k, t)| (k, t.porcentaje_total)))?;

    for (tipo, planned_type) in &self.0 {
      check_siblings(
        tipo,
        planned_type
          .areas
          .iter()
          .map(|(k, a)| (k, a.porcentaje_del_total)),
      )?;

      for (area, planned_area) in &planned_type.areas {
        if let Some(ejercicios) = &planned_area.ejercicios {
          check_siblings(
            &format!("{} / {}", tipo, area),
            ejercicios.iter().map(|(k, e)| (k, e.porcentaje_del_total)),
          )?;
        }
      }
    }

    Ok(())
  }
}

fn check_siblings<'a>(
  parent: &str,
  siblings: impl Iterator<Item = (&'a String, f64)>,
) -> Result<()> {
  let mut sum = 0.0;
  let mut seen: BTreeMap<String, &String> = BTreeMap::new();
  for (name, pct) in siblings {
    if let Some(first) = seen.insert(canonical_key(name), name) {
      return Err(AppError::InvalidPlan(format!(
        "{}: \"{}\" and \"{}\" name the same category",
        parent, first, name
      )));
    }
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
      return Err(AppError::InvalidPlan(format!(
        "{} / {}: percentage {} outside 0-100",
        parent, name, pct
      )));
    }
    sum += pct;
  }
  if sum > 100.0 + PERCENT_EPSILON {
    return Err(AppError::InvalidPlan(format!(
      "{}: children sum to {:.1}%",
      parent, sum
    )));
  }
  Ok(())
}
