//! Session evaluation schema and its migration from the legacy layout
//!
//! Older sessions carry `rendimientoJugador`, a free-text rating. Newer ones carry
//! `evaluacionGeneral`. Rows store an explicit version next to the JSON payload and
//! are upgraded once, when read, through [`migrate_evaluation`].

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const LEGACY_EVALUATION_VERSION: i64 = 1;
pub const CURRENT_EVALUATION_VERSION: i64 = 2;

/// Current evaluation shape used everywhere past the store boundary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralEvaluation {
  /// 1 (poor) to 5 (excellent)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub puntuacion: Option<u8>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comentarios: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPerformance {
  pub rendimiento_jugador: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredEvaluation {
  V1(LegacyPerformance),
  V2(GeneralEvaluation),
}

impl StoredEvaluation {
  /// Decode a stored payload according to its version column
  pub fn decode(version: i64, json: &str) -> Result<Self> {
    match version {
      LEGACY_EVALUATION_VERSION => Ok(Self::V1(serde_json::from_str(json)?)),
      CURRENT_EVALUATION_VERSION => Ok(Self::V2(serde_json::from_str(json)?)),
      other => Err(AppError::InvalidSession(format!(
        "unknown evaluation version {}",
        other
      ))),
    }
  }
}

/// Upgrade any stored evaluation to the current shape
pub fn migrate_evaluation(stored: StoredEvaluation) -> GeneralEvaluation {
  match stored {
    StoredEvaluation::V2(current) => current,
    StoredEvaluation::V1(legacy) => {
      let text = legacy.rendimiento_jugador.trim();
      match legacy_score(text) {
        Some(score) => GeneralEvaluation {
          puntuacion: Some(score),
          comentarios: None,
        },
        None => GeneralEvaluation {
          puntuacion: None,
          comentarios: (!text.is_empty()).then(|| text.to_string()),
        },
      }
    }
  }
}

fn legacy_score(text: &str) -> Option<u8> {
  let normalized = text
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

  match normalized.as_str() {
    "excelente" => Some(5),
    "muy bueno" | "bueno" => Some(4),
    "regular" => Some(3),
    "malo" => Some(2),
    "muy malo" => Some(1),
    other => other.parse::<u8>().ok().filter(|n| (1..=5).contains(n)),
  }
}
