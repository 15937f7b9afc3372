use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::GeneralEvaluation;
use crate::error::{AppError, Result};

/// One drill logged during a session. `tiempo_cantidad` is free text such as "20m" or "30 reps".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedExercise {
  pub id: String,
  pub tipo: String,
  pub area: String,
  #[serde(default)]
  pub ejercicio: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ejercicio_especifico: Option<String>,
  #[serde(default)]
  pub tiempo_cantidad: String,
  pub intensidad: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSession {
  pub id: String,
  pub academia_id: String,
  pub jugador_id: String,
  pub entrenador_id: String,
  pub fecha: DateTime<Utc>,
  #[serde(default)]
  pub ejercicios: Vec<LoggedExercise>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub observaciones: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub evaluacion: Option<GeneralEvaluation>,
}

impl TrainingSession {
  /// Reject sessions the store should never persist
  pub fn validate(&self) -> Result<()> {
    if self.id.trim().is_empty() {
      return Err(AppError::InvalidSession("session id is empty".to_string()));
    }
    if self.jugador_id.trim().is_empty() {
      return Err(AppError::InvalidSession(format!(
        "session {} has no jugadorId",
        self.id
      )));
    }
    if let Some(bad) = self
      .ejercicios
      .iter()
      .find(|e| !(1..=10).contains(&e.intensidad))
    {
      return Err(AppError::InvalidSession(format!(
        "exercise {} has intensidad {} (expected 1-10)",
        bad.id, bad.intensidad
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{mock_exercise, mock_session};

  #[test]
  fn test_exercise_deserializes_camel_case() {
    let json = r#"{
      "id": "e1",
      "tipo": "Canasto",
      "area": "Red",
      "ejercicio": "Volea",
      "ejercicioEspecifico": "Volea de revés",
      "tiempoCantidad": "15m",
      "intensidad": 7
    }"#;
    let exercise: LoggedExercise = serde_json::from_str(json).unwrap();
    assert_eq!(exercise.ejercicio_especifico.as_deref(), Some("Volea de revés"));
    assert_eq!(exercise.tiempo_cantidad, "15m");
  }

  #[test]
  fn test_validate_rejects_out_of_range_intensity() {
    let mut session = mock_session("s1", "p1", 0, vec![mock_exercise("Canasto", "Red", "Volea", "10m")]);
    session.ejercicios[0].intensidad = 11;
    let err = session.validate().unwrap_err();
    assert!(err.to_string().contains("intensidad 11"));
  }

  #[test]
  fn test_validate_requires_player() {
    let session = mock_session("s1", " ", 0, vec![]);
    assert!(matches!(session.validate(), Err(AppError::InvalidSession(_))));
  }
}
