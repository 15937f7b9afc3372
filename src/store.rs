//! Document store for plans and sessions
//!
//! The analysis code only needs full snapshots of a player's plan and an academy's
//! sessions, expressed by [`TrainingStore`]. [`SqliteStore`] keeps each plan tree and
//! exercise list as a JSON document inside its row.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::future::Future;

use crate::error::{AppError, Result};
use crate::models::evaluation::CURRENT_EVALUATION_VERSION;
use crate::models::{
  migrate_evaluation, LoggedExercise, Planificacion, StoredEvaluation, TrainingPlan,
  TrainingSession,
};

pub trait TrainingStore: Send + Sync {
  /// The player's active plan, `None` when the coach has not written one
  fn get_training_plan(
    &self,
    academia_id: &str,
    jugador_id: &str,
  ) -> impl Future<Output = Result<Option<TrainingPlan>>> + Send;

  /// Every session of the academy; callers filter by player and date
  fn get_sessions(
    &self,
    academia_id: &str,
  ) -> impl Future<Output = Result<Vec<TrainingSession>>> + Send;
}

#[derive(Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Validate and upsert the plan for (academia, jugador).
  ///
  /// A player has one plan, so saving replaces both its tree and its id. An id that
  /// already belongs to another player's plan is rejected.
  pub async fn save_training_plan(&self, plan: &TrainingPlan) -> Result<()> {
    plan.planificacion.validate()?;
    let planificacion_json = serde_json::to_string(&plan.planificacion)?;

    let owner: Option<(String, String)> =
      sqlx::query_as("SELECT academia_id, jugador_id FROM training_plans WHERE id = ?1")
        .bind(&plan.id)
        .fetch_optional(&self.pool)
        .await?;
    if let Some((academia_id, jugador_id)) = owner {
      if academia_id != plan.academia_id || jugador_id != plan.jugador_id {
        return Err(AppError::InvalidPlan(format!(
          "plan id {} already belongs to player {}",
          plan.id, jugador_id
        )));
      }
    }

    sqlx::query(
      r#"
      INSERT INTO training_plans (id, academia_id, jugador_id, planificacion_json, updated_at)
      VALUES (?1, ?2, ?3, ?4, ?5)
      ON CONFLICT(academia_id, jugador_id) DO UPDATE SET
        id = excluded.id,
        planificacion_json = excluded.planificacion_json,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(&plan.id)
    .bind(&plan.academia_id)
    .bind(&plan.jugador_id)
    .bind(&planificacion_json)
    .bind(Utc::now().to_rfc3339())
    .execute(&self.pool)
    .await?;

    tracing::info!(
      academia_id = %plan.academia_id,
      jugador_id = %plan.jugador_id,
      tipos = plan.planificacion.0.len(),
      "saved training plan"
    );
    Ok(())
  }

  /// Insert or replace a session; evaluations are always written in the current schema
  pub async fn save_session(&self, session: &TrainingSession) -> Result<()> {
    session.validate()?;
    let ejercicios_json = serde_json::to_string(&session.ejercicios)?;
    let evaluacion_json = session
      .evaluacion
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;
    let evaluacion_version = evaluacion_json.as_ref().map(|_| CURRENT_EVALUATION_VERSION);

    sqlx::query(
      r#"
      INSERT INTO training_sessions (
        id, academia_id, jugador_id, entrenador_id, fecha,
        ejercicios_json, observaciones, evaluacion_version, evaluacion_json
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
      ON CONFLICT(id) DO UPDATE SET
        academia_id = excluded.academia_id,
        jugador_id = excluded.jugador_id,
        entrenador_id = excluded.entrenador_id,
        fecha = excluded.fecha,
        ejercicios_json = excluded.ejercicios_json,
        observaciones = excluded.observaciones,
        evaluacion_version = excluded.evaluacion_version,
        evaluacion_json = excluded.evaluacion_json
      "#,
    )
    .bind(&session.id)
    .bind(&session.academia_id)
    .bind(&session.jugador_id)
    .bind(&session.entrenador_id)
    .bind(session.fecha.to_rfc3339())
    .bind(&ejercicios_json)
    .bind(&session.observaciones)
    .bind(evaluacion_version)
    .bind(&evaluacion_json)
    .execute(&self.pool)
    .await?;

    tracing::debug!(session_id = %session.id, exercises = session.ejercicios.len(), "saved session");
    Ok(())
  }

  /// Returns false when no session had that id
  pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM training_sessions WHERE id = ?1")
      .bind(session_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

impl TrainingStore for SqliteStore {
  async fn get_training_plan(
    &self,
    academia_id: &str,
    jugador_id: &str,
  ) -> Result<Option<TrainingPlan>> {
    let row = sqlx::query(
      r#"
      SELECT id, academia_id, jugador_id, planificacion_json
      FROM training_plans
      WHERE academia_id = ?1 AND jugador_id = ?2
      "#,
    )
    .bind(academia_id)
    .bind(jugador_id)
    .fetch_optional(&self.pool)
    .await?;

    let Some(row) = row else {
      return Ok(None);
    };

    let planificacion_json: String = row.get("planificacion_json");
    let planificacion: Planificacion = serde_json::from_str(&planificacion_json)?;

    Ok(Some(TrainingPlan {
      id: row.get("id"),
      academia_id: row.get("academia_id"),
      jugador_id: row.get("jugador_id"),
      planificacion,
    }))
  }

  async fn get_sessions(&self, academia_id: &str) -> Result<Vec<TrainingSession>> {
    let rows = sqlx::query(
      r#"
      SELECT
        id, academia_id, jugador_id, entrenador_id, fecha,
        ejercicios_json, observaciones, evaluacion_version, evaluacion_json
      FROM training_sessions
      WHERE academia_id = ?1
      ORDER BY fecha DESC
      "#,
    )
    .bind(academia_id)
    .fetch_all(&self.pool)
    .await?;

    let mut sessions = Vec::with_capacity(rows.len());
    for row in rows {
      let id: String = row.get("id");
      let fecha_str: String = row.get("fecha");
      let fecha = DateTime::parse_from_rfc3339(&fecha_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::InvalidSession(format!("session {} has bad fecha: {}", id, e)))?;

      let ejercicios_json: String = row.get("ejercicios_json");
      let ejercicios: Vec<LoggedExercise> = serde_json::from_str(&ejercicios_json)?;

      let evaluacion_version: Option<i64> = row.get("evaluacion_version");
      let evaluacion_json: Option<String> = row.get("evaluacion_json");
      let evaluacion = match (evaluacion_version, evaluacion_json) {
        (Some(version), Some(json)) => {
          Some(migrate_evaluation(StoredEvaluation::decode(version, &json)?))
        }
        _ => None,
      };

      sessions.push(TrainingSession {
        id,
        academia_id: row.get("academia_id"),
        jugador_id: row.get("jugador_id"),
        entrenador_id: row.get("entrenador_id"),
        fecha,
        ejercicios,
        observaciones: row.get("observaciones"),
        evaluacion,
      });
    }

    tracing::debug!(academia_id, count = sessions.len(), "loaded sessions");
    Ok(sessions)
  }
}
