use serde::Serialize;

/// All errors that can surface from the store, config, and command layers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Invalid training plan: {0}")]
  InvalidPlan(String),

  #[error("Invalid training session: {0}")]
  InvalidSession(String),

  #[error("Invalid configuration for {key}: {message}")]
  Config { key: String, message: String },

  #[error("Not found: {0}")]
  NotFound(String),
}

// Command callers receive errors as plain strings.
impl Serialize for AppError {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

pub type Result<T> = std::result::Result<T, AppError>;
