pub mod analysis;
pub mod commands;
pub mod comparison;
pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod logging;
pub mod models;
pub mod store;

#[cfg(test)]
mod test_utils;

use config::AppConfig;
use error::Result;

/// Load `.env`, read configuration and install logging
pub fn bootstrap() -> Result<AppConfig> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let config = AppConfig::from_env()?;
  logging::init_logging(config.log_format);
  Ok(config)
}
