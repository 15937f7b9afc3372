//! Environment-driven configuration
//!
//! Values come from the process environment after `.env` has been loaded.

use std::env;

use crate::error::{AppError, Result};

/// ---------------------------------------------------------------------------
/// Defaults
/// ---------------------------------------------------------------------------

pub const DEFAULT_DATABASE_URL: &str = "sqlite://academy-planning.db?mode=rwc";
pub const DEFAULT_ANALYSIS_WINDOW_DAYS: i64 = 30;
/// Percentage points a node may drift from its plan before a recommendation is raised
pub const DEFAULT_DEVIATION_TOLERANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub analysis_window_days: i64,
  pub deviation_tolerance: f64,
  pub log_format: LogFormat,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      analysis_window_days: DEFAULT_ANALYSIS_WINDOW_DAYS,
      deviation_tolerance: DEFAULT_DEVIATION_TOLERANCE,
      log_format: LogFormat::Pretty,
    }
  }
}

impl AppConfig {
  /// Read configuration from the environment, falling back to defaults for unset keys
  pub fn from_env() -> Result<Self> {
    let defaults = Self::default();

    let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);

    let analysis_window_days = match env::var("ANALYSIS_WINDOW_DAYS") {
      Ok(raw) => match raw.trim().parse::<i64>() {
        Ok(days) if days > 0 => days,
        _ => return Err(config_error("ANALYSIS_WINDOW_DAYS", "expected a positive integer")),
      },
      Err(_) => defaults.analysis_window_days,
    };

    let deviation_tolerance = match env::var("DEVIATION_TOLERANCE") {
      Ok(raw) => match raw.trim().parse::<f64>() {
        Ok(tol) if tol.is_finite() && tol >= 0.0 => tol,
        _ => return Err(config_error("DEVIATION_TOLERANCE", "expected a non-negative number")),
      },
      Err(_) => defaults.deviation_tolerance,
    };

    let log_format = match env::var("LOG_FORMAT").as_deref().map(str::trim) {
      Ok("json") => LogFormat::Json,
      Ok("pretty") | Ok("") | Err(_) => LogFormat::Pretty,
      Ok(other) => {
        return Err(config_error(
          "LOG_FORMAT",
          &format!("unknown format '{}', expected pretty or json", other),
        ))
      }
    };

    Ok(Self {
      database_url,
      analysis_window_days,
      deviation_tolerance,
      log_format,
    })
  }
}

fn config_error(key: &str, message: &str) -> AppError {
  AppError::Config {
    key: key.to_string(),
    message: message.to_string(),
  }
}
