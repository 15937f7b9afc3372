pub mod analysis;
pub mod plan;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::loader::sessions_in_window;
use crate::models::TrainingSession;
use crate::store::TrainingStore;
use chrono::Utc;

/// Store a finished session (or an edit of one)
pub async fn record_session(state: &AppState, session: TrainingSession) -> Result<TrainingSession> {
  state.store().save_session(&session).await?;
  Ok(session)
}

/// A player's sessions, newest first; `window_days` of `None` means all of them
pub async fn list_sessions(
  state: &AppState,
  academia_id: &str,
  jugador_id: &str,
  window_days: Option<i64>,
) -> Result<Vec<TrainingSession>> {
  let sessions = state.store().get_sessions(academia_id).await?;
  Ok(match window_days {
    Some(days) => sessions_in_window(sessions, jugador_id, days, Utc::now()),
    None => sessions
      .into_iter()
      .filter(|s| s.jugador_id == jugador_id)
      .collect(),
  })
}

pub async fn delete_session(state: &AppState, session_id: &str) -> Result<()> {
  if state.store().delete_session(session_id).await? {
    Ok(())
  } else {
    Err(AppError::NotFound(format!("session {}", session_id)))
  }
}
