use serde::Serialize;

use crate::comparison::AdherenceReport;
use crate::db::AppState;
use crate::loader::{AnalysisRequest, AnalysisState};
use crate::models::LoggedExercise;

/// ---------------------------------------------------------------------------
/// Planning Analysis
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
  Ready,
  NoPlan,
  Failed,
  /// The loader produced no result for this request
  Pending,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningAnalysis {
  pub status: AnalysisStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  pub sessions_analyzed: usize,
  pub report: AdherenceReport,
}

/// Load the player's plan and recent sessions, then compare them.
///
/// `window_days` falls back to the configured analysis window. `live_exercises` are
/// exercises of a session still in progress and not saved yet.
pub async fn get_planning_analysis(
  state: &AppState,
  academia_id: String,
  jugador_id: String,
  window_days: Option<i64>,
  live_exercises: Vec<LoggedExercise>,
) -> PlanningAnalysis {
  let request = AnalysisRequest {
    academia_id,
    jugador_id,
    window_days: window_days.unwrap_or(state.config.analysis_window_days),
  };

  // Answer from what this request fetched, even if a newer load has since replaced the
  // loader's current state
  let loaded = state.analysis.load(request).await;
  let report = state.analysis.report_for(&loaded.state, &live_exercises);

  match loaded.state {
    AnalysisState::Ready { sessions, .. } => PlanningAnalysis {
      status: AnalysisStatus::Ready,
      message: None,
      sessions_analyzed: sessions.len(),
      report,
    },
    AnalysisState::NoPlan { message, .. } => PlanningAnalysis {
      status: AnalysisStatus::NoPlan,
      message: Some(message),
      sessions_analyzed: 0,
      report,
    },
    AnalysisState::Failed { message, .. } => PlanningAnalysis {
      status: AnalysisStatus::Failed,
      message: Some(message),
      sessions_analyzed: 0,
      report,
    },
    AnalysisState::Idle | AnalysisState::Loading { .. } => PlanningAnalysis {
      status: AnalysisStatus::Pending,
      message: None,
      sessions_analyzed: 0,
      report,
    },
  }
}
