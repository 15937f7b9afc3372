//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - An in-memory store with injectable delays and failures
//! - Helper assertions

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{AppError, Result};
use crate::models::{
  LoggedExercise, PlannedArea, PlannedExercise, PlannedType, Planificacion, TrainingPlan,
  TrainingSession,
};
use crate::store::TrainingStore;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

static NEXT_EXERCISE_ID: AtomicUsize = AtomicUsize::new(1);

pub fn mock_exercise(tipo: &str, area: &str, ejercicio: &str, tiempo_cantidad: &str) -> LoggedExercise {
  LoggedExercise {
    id: format!("ex-{}", NEXT_EXERCISE_ID.fetch_add(1, Ordering::Relaxed)),
    tipo: tipo.to_string(),
    area: area.to_string(),
    ejercicio: ejercicio.to_string(),
    ejercicio_especifico: None,
    tiempo_cantidad: tiempo_cantidad.to_string(),
    intensidad: 6,
  }
}

/// Session in academia "a1" coached by "c1", dated `days_ago` days before now
pub fn mock_session(
  id: &str,
  jugador_id: &str,
  days_ago: i64,
  ejercicios: Vec<LoggedExercise>,
) -> TrainingSession {
  TrainingSession {
    id: id.to_string(),
    academia_id: "a1".to_string(),
    jugador_id: jugador_id.to_string(),
    entrenador_id: "c1".to_string(),
    fecha: datetime_days_ago(days_ago),
    ejercicios,
    observaciones: None,
    evaluacion: None,
  }
}

/// Canasto 60 (Red 30 {Volea 20}, Juego De Base 30 free), Pelota Viva 40 (Red 40 free)
pub fn mock_planificacion() -> Planificacion {
  let mut volea = BTreeMap::new();
  volea.insert(
    "Volea".to_string(),
    PlannedExercise {
      porcentaje_del_total: 20.0,
    },
  );

  let mut canasto_areas = BTreeMap::new();
  canasto_areas.insert(
    "Red".to_string(),
    PlannedArea {
      porcentaje_del_total: 30.0,
      ejercicios: Some(volea),
    },
  );
  canasto_areas.insert(
    "Juego De Base".to_string(),
    PlannedArea {
      porcentaje_del_total: 30.0,
      ejercicios: None,
    },
  );

  let mut pelota_areas = BTreeMap::new();
  pelota_areas.insert(
    "Red".to_string(),
    PlannedArea {
      porcentaje_del_total: 40.0,
      ejercicios: None,
    },
  );

  let mut plan = BTreeMap::new();
  plan.insert(
    "Canasto".to_string(),
    PlannedType {
      porcentaje_total: 60.0,
      areas: canasto_areas,
    },
  );
  plan.insert(
    "Pelota Viva".to_string(),
    PlannedType {
      porcentaje_total: 40.0,
      areas: pelota_areas,
    },
  );

  Planificacion(plan)
}

pub fn mock_plan(academia_id: &str, jugador_id: &str) -> TrainingPlan {
  TrainingPlan {
    id: format!("plan-{}", jugador_id),
    jugador_id: jugador_id.to_string(),
    academia_id: academia_id.to_string(),
    planificacion: mock_planificacion(),
  }
}

/// ---------------------------------------------------------------------------
/// In-Memory Store
/// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
  pub plans: Vec<TrainingPlan>,
  pub sessions: Vec<TrainingSession>,
  pub fail_sessions: bool,
  /// Delay plan reads for this player
  pub delay_for: Option<(String, std::time::Duration)>,
}

impl TrainingStore for MemoryStore {
  async fn get_training_plan(
    &self,
    academia_id: &str,
    jugador_id: &str,
  ) -> Result<Option<TrainingPlan>> {
    if let Some((slow_player, delay)) = &self.delay_for {
      if slow_player == jugador_id {
        tokio::time::sleep(*delay).await;
      }
    }
    Ok(
      self
        .plans
        .iter()
        .find(|p| p.academia_id == academia_id && p.jugador_id == jugador_id)
        .cloned(),
    )
  }

  async fn get_sessions(&self, academia_id: &str) -> Result<Vec<TrainingSession>> {
    if self.fail_sessions {
      return Err(AppError::Database(sqlx::Error::PoolTimedOut));
    }
    Ok(
      self
        .sessions
        .iter()
        .filter(|s| s.academia_id == academia_id)
        .cloned()
        .collect(),
    )
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('training_plans', 'training_sessions')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 2, "Expected 2 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    assert!(mock_planificacion().validate().is_ok());

    let session = mock_session("s1", "p1", 1, vec![mock_exercise("Canasto", "Red", "Volea", "10m")]);
    assert!(session.validate().is_ok());

    let a = mock_exercise("Canasto", "Red", "Volea", "10m");
    let b = mock_exercise("Canasto", "Red", "Volea", "10m");
    assert_ne!(a.id, b.id);
  }

  #[test]
  fn test_datetime_helpers_produce_correct_dates() {
    let past = datetime_days_ago(7);
    let diff = Utc::now() - past;
    assert!(diff.num_days() >= 6 && diff.num_days() <= 8,
            "Expected ~7 days difference, got {}", diff.num_days());
  }
}
