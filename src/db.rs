use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::AppConfig;
use crate::error::Result;
use crate::loader::AnalysisLoader;
use crate::store::SqliteStore;

pub type DbPool = SqlitePool;

/// Application state shared by every command
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
  pub analysis: AnalysisLoader<SqliteStore>,
}

impl AppState {
  pub async fn from_config(config: AppConfig) -> Result<Self> {
    let db = initialize_db(&config.database_url).await?;
    Ok(Self::with_pool(db, config))
  }

  pub fn with_pool(db: DbPool, config: AppConfig) -> Self {
    let analysis = AnalysisLoader::new(SqliteStore::new(db.clone()), config.deviation_tolerance);
    Self {
      db,
      config,
      analysis,
    }
  }

  pub fn store(&self) -> &SqliteStore {
    self.analysis.store()
  }
}

/// Open the connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool> {
  tracing::info!(database_url, "initializing database");

  // An in-memory database exists per connection, so keep a single one
  let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

  let pool = SqlitePoolOptions::new()
    .max_connections(max_connections)
    .connect(database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("database initialized successfully");

  Ok(pool)
}
