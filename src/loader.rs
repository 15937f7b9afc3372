//! Plan and session loading for the adherence analysis
//!
//! Each [`AnalysisLoader::load`] is stamped with a generation number. A result is only
//! committed as the loader's current state if no newer load has started since, so a
//! slow request for a previous player or window can never overwrite the current one.
//! The caller always gets back the data its own request fetched.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::analysis::aggregate;
use crate::comparison::AdherenceReport;
use crate::models::{LoggedExercise, TrainingPlan, TrainingSession};
use crate::store::TrainingStore;

pub const NO_PLAN_MESSAGE: &str = "No training plan found for this player";
pub const LOAD_ERROR_MESSAGE: &str = "Error loading analysis data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
  pub academia_id: String,
  pub jugador_id: String,
  pub window_days: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisState {
  #[default]
  Idle,
  Loading {
    request: AnalysisRequest,
  },
  /// Valid empty state: the coach has not written a plan yet
  NoPlan {
    request: AnalysisRequest,
    message: String,
  },
  Failed {
    request: AnalysisRequest,
    message: String,
  },
  Ready {
    request: AnalysisRequest,
    plan: TrainingPlan,
    sessions: Vec<TrainingSession>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
  Applied,
  /// A newer load started before this one finished; the current state was kept
  Stale,
}

/// What one [`AnalysisLoader::load`] fetched, and whether it became the current state
#[derive(Debug, Clone)]
pub struct LoadResult {
  pub outcome: LoadOutcome,
  pub state: AnalysisState,
}

/// Sessions of one player dated within the last `window_days` before `now`
pub fn sessions_in_window(
  sessions: Vec<TrainingSession>,
  jugador_id: &str,
  window_days: i64,
  now: DateTime<Utc>,
) -> Vec<TrainingSession> {
  let cutoff = now - Duration::days(window_days);
  sessions
    .into_iter()
    .filter(|s| s.jugador_id == jugador_id && s.fecha >= cutoff)
    .collect()
}

pub struct AnalysisLoader<S> {
  store: S,
  tolerance: f64,
  generation: AtomicU64,
  state: RwLock<AnalysisState>,
}

impl<S: TrainingStore> AnalysisLoader<S> {
  pub fn new(store: S, tolerance: f64) -> Self {
    Self {
      store,
      tolerance,
      generation: AtomicU64::new(0),
      state: RwLock::new(AnalysisState::Idle),
    }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub async fn state(&self) -> AnalysisState {
    self.state.read().await.clone()
  }

  /// Fetch plan and sessions for `request` and commit them unless superseded
  pub async fn load(&self, request: AnalysisRequest) -> LoadResult {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    *self.state.write().await = AnalysisState::Loading {
      request: request.clone(),
    };

    let next = self.fetch(request).await;

    // Check under the write lock so a newer commit cannot slip in between
    let mut state = self.state.write().await;
    if self.generation.load(Ordering::SeqCst) != generation {
      tracing::warn!(generation, "discarding stale analysis load");
      return LoadResult {
        outcome: LoadOutcome::Stale,
        state: next,
      };
    }
    *state = next.clone();
    LoadResult {
      outcome: LoadOutcome::Applied,
      state: next,
    }
  }

  async fn fetch(&self, request: AnalysisRequest) -> AnalysisState {
    let plan = match self
      .store
      .get_training_plan(&request.academia_id, &request.jugador_id)
      .await
    {
      Ok(Some(plan)) => plan,
      Ok(None) => {
        tracing::info!(jugador_id = %request.jugador_id, "no training plan");
        return AnalysisState::NoPlan {
          request,
          message: NO_PLAN_MESSAGE.to_string(),
        };
      }
      Err(e) => return Self::failed(request, e),
    };

    let sessions = match self.store.get_sessions(&request.academia_id).await {
      Ok(all) => sessions_in_window(all, &request.jugador_id, request.window_days, Utc::now()),
      Err(e) => return Self::failed(request, e),
    };

    tracing::info!(
      jugador_id = %request.jugador_id,
      window_days = request.window_days,
      sessions = sessions.len(),
      "analysis data loaded"
    );

    AnalysisState::Ready {
      request,
      plan,
      sessions,
    }
  }

  fn failed(request: AnalysisRequest, error: crate::error::AppError) -> AnalysisState {
    tracing::warn!(error = %error, jugador_id = %request.jugador_id, "failed to load analysis data");
    AnalysisState::Failed {
      request,
      message: LOAD_ERROR_MESSAGE.to_string(),
    }
  }

  /// Adherence report over the current state's sessions plus any unsaved in-progress
  /// exercises.
  ///
  /// Empty unless the last committed load succeeded with a plan.
  pub async fn report(&self, live_exercises: &[LoggedExercise]) -> AdherenceReport {
    let state = self.state.read().await;
    self.report_for(&state, live_exercises)
  }

  /// Same as [`report`](Self::report) over an explicit state, such as a [`LoadResult`]'s
  pub fn report_for(
    &self,
    state: &AnalysisState,
    live_exercises: &[LoggedExercise],
  ) -> AdherenceReport {
    match state {
      AnalysisState::Ready { plan, sessions, .. } => {
        let exercises = sessions
          .iter()
          .flat_map(|s| s.ejercicios.iter())
          .chain(live_exercises.iter());
        let stats = aggregate(exercises);
        AdherenceReport::build(&plan.planificacion, &stats, self.tolerance)
      }
      _ => AdherenceReport::default(),
    }
  }
}
