//! Tracing subscriber setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Install the global subscriber. `RUST_LOG` wins over the default `info` level.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  let registry = tracing_subscriber::registry().with(filter);
  let result = match format {
    LogFormat::Json => registry
      .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
      .try_init(),
    LogFormat::Pretty => registry
      .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
      .try_init(),
  };

  if result.is_ok() {
    tracing::debug!(?format, "logging initialized");
  }
}
