//! Training plan commands

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::models::TrainingPlan;
use crate::store::TrainingStore;

/// Get the player's plan, or `NotFound` when none exists
pub async fn get_training_plan(
  state: &AppState,
  academia_id: &str,
  jugador_id: &str,
) -> Result<TrainingPlan> {
  state
    .store()
    .get_training_plan(academia_id, jugador_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("training plan for player {}", jugador_id)))
}

/// Validate and store a plan, replacing the player's previous one
pub async fn save_training_plan(state: &AppState, plan: TrainingPlan) -> Result<TrainingPlan> {
  state.store().save_training_plan(&plan).await?;
  get_training_plan(state, &plan.academia_id, &plan.jugador_id).await
}
