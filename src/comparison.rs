//! Plan-vs-actual comparison
//!
//! Walks the coach's planned distribution and lines it up against the aggregated
//! time stats. The plan drives the walk: categories that were trained but never
//! planned do not appear in the tree. They are listed separately in
//! [`AdherenceReport::unplanned`] so the omission stays visible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::analysis::{canonical_key, AreaStat, TimeStats, TypeStat};
use crate::models::{PlannedArea, PlannedType, Planificacion};

/// ---------------------------------------------------------------------------
/// Analysis Tree
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisNode {
  pub name: String,
  pub planificado: f64,
  pub realizado: f64,
  /// planificado - realizado; positive means under-trained
  pub diferencia: f64,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub es_distribucion_libre: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<AnalysisNode>,
}

impl AnalysisNode {
  fn new(name: &str, planificado: f64, realizado: f64) -> Self {
    Self {
      name: name.to_string(),
      planificado,
      realizado,
      diferencia: planificado - realizado,
      es_distribucion_libre: false,
      children: Vec::new(),
    }
  }
}

/// Build the tipo -> area -> ejercicio comparison tree.
///
/// Every planned node appears exactly once; missing actual data counts as 0%.
pub fn build_analysis_tree(plan: &Planificacion, stats: &TimeStats) -> Vec<AnalysisNode> {
  plan
    .iter()
    .map(|(tipo, planned_type)| {
      let actual_type = stats.type_stats.get(&canonical_key(tipo));
      let realizado = actual_type
        .map(|t| t.areas.values().map(|a| a.percentage).sum::<f64>())
        .unwrap_or(0.0);

      let mut node = AnalysisNode::new(tipo, planned_type.porcentaje_total, realizado);
      node.children = planned_type
        .areas
        .iter()
        .map(|(area, planned_area)| {
          let actual_area = actual_type.and_then(|t| t.areas.get(&canonical_key(area)));
          build_area_node(area, planned_area, actual_area, stats.total_minutes)
        })
        .collect();
      node
    })
    .collect()
}

fn build_area_node(
  area: &str,
  planned: &PlannedArea,
  actual: Option<&AreaStat>,
  total_minutes: f64,
) -> AnalysisNode {
  let realizado = actual.map(|a| a.percentage).unwrap_or(0.0);
  let mut node = AnalysisNode::new(area, planned.porcentaje_del_total, realizado);

  match planned.ejercicios.as_ref().filter(|e| !e.is_empty()) {
    None => node.es_distribucion_libre = true,
    Some(ejercicios) => {
      node.children = ejercicios
        .iter()
        .map(|(name, planned_exercise)| {
          let minutes = actual
            .and_then(|a| a.exercises.get(&canonical_key(name)))
            .copied()
            .unwrap_or(0.0);
          let realizado = if total_minutes > 0.0 {
            minutes / total_minutes * 100.0
          } else {
            0.0
          };
          AnalysisNode::new(name, planned_exercise.porcentaje_del_total, realizado)
        })
        .collect();
    }
  }

  node
}

/// ---------------------------------------------------------------------------
/// Recommendations
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationAction {
  /// Trained less than planned
  Increase,
  /// Trained more than planned
  Reduce,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
  /// Node names from tipo down, e.g. ["Canasto", "Red", "Volea"]
  pub path: Vec<String>,
  pub action: RecommendationAction,
  /// Percentage points to add or remove
  pub amount: f64,
}

/// Collect every node drifting from its plan by more than `tolerance` points,
/// largest drift first.
pub fn recommendations(tree: &[AnalysisNode], tolerance: f64) -> Vec<Recommendation> {
  let mut found = Vec::new();
  let mut path = Vec::new();
  for node in tree {
    collect_recommendations(node, tolerance, &mut path, &mut found);
  }

  found.sort_by(|a, b| {
    b.amount
      .total_cmp(&a.amount)
      .then_with(|| a.path.cmp(&b.path))
  });
  found
}

fn collect_recommendations(
  node: &AnalysisNode,
  tolerance: f64,
  path: &mut Vec<String>,
  found: &mut Vec<Recommendation>,
) {
  path.push(node.name.clone());

  if node.diferencia.abs() > tolerance {
    found.push(Recommendation {
      path: path.clone(),
      action: if node.diferencia > 0.0 {
        RecommendationAction::Increase
      } else {
        RecommendationAction::Reduce
      },
      amount: node.diferencia.abs(),
    });
  }

  for child in &node.children {
    collect_recommendations(child, tolerance, path, found);
  }

  path.pop();
}

/// ---------------------------------------------------------------------------
/// Unplanned Categories
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnplannedCategory {
  pub path: Vec<String>,
  /// Share of all logged minutes
  pub realizado: f64,
}

/// Trained tipos, areas and exercises the plan has no node for
pub fn unplanned_categories(plan: &Planificacion, stats: &TimeStats) -> Vec<UnplannedCategory> {
  let mut unplanned = Vec::new();

  for (tipo, actual_type) in &stats.type_stats {
    let planned_types: Vec<_> = plan
      .iter()
      .filter(|(key, _)| canonical_key(key) == *tipo)
      .map(|(_, planned)| planned)
      .collect();

    if planned_types.is_empty() {
      unplanned.push(UnplannedCategory {
        path: vec![tipo.clone()],
        realizado: actual_type.percentage,
      });
      continue;
    }

    collect_unplanned_areas(tipo, actual_type, &planned_types, stats.total_minutes, &mut unplanned);
  }

  unplanned
}

fn collect_unplanned_areas(
  tipo: &str,
  actual_type: &TypeStat,
  planned_types: &[&PlannedType],
  total_minutes: f64,
  unplanned: &mut Vec<UnplannedCategory>,
) {
  for (area, actual_area) in &actual_type.areas {
    let planned_areas: Vec<&PlannedArea> = planned_types
      .iter()
      .flat_map(|t| t.areas.iter())
      .filter(|(key, _)| canonical_key(key) == *area)
      .map(|(_, planned)| planned)
      .collect();

    if planned_areas.is_empty() {
      unplanned.push(UnplannedCategory {
        path: vec![tipo.to_string(), area.clone()],
        realizado: actual_area.percentage,
      });
      continue;
    }

    // A free-distribution area covers every exercise under it
    if planned_areas.iter().any(|a| a.is_free_distribution()) {
      continue;
    }

    let planned_exercises: BTreeSet<String> = planned_areas
      .iter()
      .filter_map(|a| a.ejercicios.as_ref())
      .flat_map(|e| e.keys())
      .map(|key| canonical_key(key))
      .collect();

    for (exercise, minutes) in &actual_area.exercises {
      if !planned_exercises.contains(exercise) {
        unplanned.push(UnplannedCategory {
          path: vec![tipo.to_string(), area.clone(), exercise.clone()],
          realizado: if total_minutes > 0.0 {
            minutes / total_minutes * 100.0
          } else {
            0.0
          },
        });
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Adherence Report
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceReport {
  pub total_minutes: f64,
  pub tree: Vec<AnalysisNode>,
  pub recommendations: Vec<Recommendation>,
  pub unplanned: Vec<UnplannedCategory>,
}

impl AdherenceReport {
  pub fn build(plan: &Planificacion, stats: &TimeStats, tolerance: f64) -> Self {
    let tree = build_analysis_tree(plan, stats);
    let recommendations = recommendations(&tree, tolerance);
    let unplanned = unplanned_categories(plan, stats);

    if !unplanned.is_empty() {
      tracing::debug!(count = unplanned.len(), "trained categories missing from plan");
    }

    Self {
      total_minutes: stats.total_minutes,
      tree,
      recommendations,
      unplanned,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.tree.is_empty()
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analysis::aggregate;
  use crate::assert_approx_eq;
  use crate::models::PlannedExercise;
  use crate::test_utils::{mock_exercise, mock_planificacion};
  use std::collections::BTreeMap;

  fn single_type_plan(tipo: &str, pct: f64) -> Planificacion {
    let mut plan = BTreeMap::new();
    plan.insert(
      tipo.to_string(),
      PlannedType {
        porcentaje_total: pct,
        areas: BTreeMap::new(),
      },
    );
    Planificacion(plan)
  }

  #[test]
  fn test_planned_type_without_actual_data() {
    let plan = single_type_plan("Canasto", 50.0);
    let stats = aggregate(&[mock_exercise("Pelota viva", "Red", "Passing", "10m")]);

    let tree = build_analysis_tree(&plan, &stats);

    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "Canasto");
    assert_eq!(tree[0].planificado, 50.0);
    assert_eq!(tree[0].realizado, 0.0);
    assert_eq!(tree[0].diferencia, 50.0);
  }

  #[test]
  fn test_unplanned_type_is_dropped_from_tree_but_reported() {
    let plan = single_type_plan("Canasto", 50.0);
    let stats = aggregate(&[mock_exercise("Pelota viva", "Red", "Passing", "10m")]);

    let report = AdherenceReport::build(&plan, &stats, 5.0);

    assert!(report.tree.iter().all(|n| n.name != "Pelota Viva"));
    assert_eq!(report.unplanned.len(), 1);
    assert_eq!(report.unplanned[0].path, vec!["Pelota Viva".to_string()]);
    assert_eq!(report.unplanned[0].realizado, 100.0);
  }

  #[test]
  fn test_full_tree_against_mock_plan() {
    // Plan: Canasto 60 (Red 30 {Volea 20}, Juego De Base 30 free), Pelota Viva 40 (Red 40 free)
    let plan = mock_planificacion();
    let exercises = vec![
      mock_exercise("canasto", "red", "volea", "20m"),
      mock_exercise("Canasto", "Red", "Smash", "10m"),
      mock_exercise("Canasto", "Juego de base", "Cruzado", "30m"),
      mock_exercise("Pelota viva", "Red", "Passing", "40m"),
    ];
    let stats = aggregate(&exercises);

    let tree = build_analysis_tree(&plan, &stats);

    assert_eq!(tree.len(), 2);
    let canasto = tree.iter().find(|n| n.name == "Canasto").unwrap();
    assert_approx_eq!(canasto.realizado, 60.0, 1e-9);
    assert_approx_eq!(canasto.diferencia, 0.0, 1e-9);

    let red = canasto.children.iter().find(|n| n.name == "Red").unwrap();
    assert!(!red.es_distribucion_libre);
    assert_approx_eq!(red.realizado, 30.0, 1e-9);
    assert_eq!(red.children.len(), 1);
    assert_approx_eq!(red.children[0].realizado, 20.0, 1e-9);
    assert!(red.children[0].children.is_empty());

    let base = canasto.children.iter().find(|n| n.name == "Juego De Base").unwrap();
    assert!(base.es_distribucion_libre);
    assert!(base.children.is_empty());
  }

  #[test]
  fn test_type_realizado_is_sum_of_areas() {
    let plan = mock_planificacion();
    let exercises = vec![
      mock_exercise("Canasto", "Red", "Volea", "13.3m"),
      mock_exercise("Canasto", "Juego de base", "Cruzado", "7.1m"),
      mock_exercise("Pelota viva", "Red", "Passing", "22m"),
    ];
    let stats = aggregate(&exercises);

    for node in build_analysis_tree(&plan, &stats) {
      let children_sum: f64 = node.children.iter().map(|c| c.realizado).sum();
      assert_approx_eq!(node.realizado, children_sum, 1e-9);
    }
  }

  #[test]
  fn test_exercise_missing_from_actual_is_zero() {
    let mut plan = mock_planificacion();
    plan
      .0
      .get_mut("Canasto")
      .unwrap()
      .areas
      .get_mut("Red")
      .unwrap()
      .ejercicios
      .as_mut()
      .unwrap()
      .insert(
        "Globo".to_string(),
        PlannedExercise {
          porcentaje_del_total: 5.0,
        },
      );
    let stats = aggregate(&[mock_exercise("Canasto", "Red", "Volea", "10m")]);

    let tree = build_analysis_tree(&plan, &stats);
    let red = &tree[0].children.iter().find(|n| n.name == "Red").unwrap();
    let globo = red.children.iter().find(|n| n.name == "Globo").unwrap();

    assert_eq!(globo.realizado, 0.0);
    assert_eq!(globo.diferencia, 5.0);
  }

  #[test]
  fn test_empty_stats_never_nan() {
    let tree = build_analysis_tree(&mock_planificacion(), &TimeStats::default());
    fn check(nodes: &[AnalysisNode]) {
      for n in nodes {
        assert_eq!(n.realizado, 0.0);
        assert!(!n.diferencia.is_nan());
        check(&n.children);
      }
    }
    check(&tree);
  }

  #[test]
  fn test_recommendations_sorted_by_drift() {
    let plan = mock_planificacion();
    // Everything in Canasto / Red / Volea
    let stats = aggregate(&[mock_exercise("Canasto", "Red", "Volea", "60m")]);
    let tree = build_analysis_tree(&plan, &stats);

    let recs = recommendations(&tree, 5.0);

    // Volea and Red are +80 and +70 over plan; Pelota Viva is 40 under
    assert_eq!(recs[0].path, vec!["Canasto", "Red", "Volea"]);
    assert_eq!(recs[0].action, RecommendationAction::Reduce);
    assert_approx_eq!(recs[0].amount, 80.0, 1e-9);
    assert_eq!(recs[1].path, vec!["Canasto", "Red"]);
    assert!(recs
      .iter()
      .any(|r| r.path == vec!["Pelota Viva"] && r.action == RecommendationAction::Increase));
    assert!(recs.windows(2).all(|w| w[0].amount >= w[1].amount));
  }

  #[test]
  fn test_recommendations_respect_tolerance() {
    let plan = single_type_plan("Canasto", 97.0);
    let stats = aggregate(&[mock_exercise("Canasto", "Red", "Volea", "10m")]);
    let tree = build_analysis_tree(&plan, &stats);

    assert!(recommendations(&tree, 5.0).is_empty());
    assert_eq!(recommendations(&tree, 1.0).len(), 1);
  }

  #[test]
  fn test_unplanned_exercise_under_explicit_breakdown() {
    let plan = mock_planificacion();
    let stats = aggregate(&[
      mock_exercise("Canasto", "Red", "Volea", "10m"),
      mock_exercise("Canasto", "Red", "Smash", "10m"),
      mock_exercise("Canasto", "Juego de base", "Cruzado", "10m"),
      mock_exercise("Canasto", "Saque", "Plano", "10m"),
    ]);

    let unplanned = unplanned_categories(&plan, &stats);
    let paths: Vec<_> = unplanned.iter().map(|u| u.path.join(" / ")).collect();

    assert_eq!(paths, vec!["Canasto / Red / Smash", "Canasto / Saque"]);
  }

  #[test]
  fn test_tree_serializes_camel_case() {
    let node = AnalysisNode {
      name: "Red".to_string(),
      planificado: 30.0,
      realizado: 10.0,
      diferencia: 20.0,
      es_distribucion_libre: true,
      children: vec![],
    };
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["esDistribucionLibre"], true);
    assert!(json.get("children").is_none());
  }
}
