use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use academy_planning_lib::commands::{self, analysis, plan};
use academy_planning_lib::db::AppState;
use academy_planning_lib::models::{LoggedExercise, TrainingPlan, TrainingSession};

#[derive(Parser)]
#[command(name = "academy-planning", version, about = "Training-plan adherence analysis for a tennis academy")]
struct Cli {
  /// Overrides DATABASE_URL
  #[arg(long, global = true)]
  database_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Compare a player's recent training against their plan
  Analyze {
    #[arg(long)]
    academia: String,
    #[arg(long)]
    jugador: String,
    /// Days of history to include (defaults to ANALYSIS_WINDOW_DAYS)
    #[arg(long)]
    days: Option<i64>,
    /// JSON array of exercises from a session still in progress
    #[arg(long)]
    live: Option<PathBuf>,
  },
  /// Store a training plan from a JSON file
  ImportPlan { file: PathBuf },
  /// Store a training session from a JSON file
  ImportSession { file: PathBuf },
  /// List a player's sessions
  Sessions {
    #[arg(long)]
    academia: String,
    #[arg(long)]
    jugador: String,
    #[arg(long)]
    days: Option<i64>,
  },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let mut config = academy_planning_lib::bootstrap()?;
  if let Some(url) = cli.database_url {
    config.database_url = url;
  }
  let state = AppState::from_config(config).await?;

  match cli.command {
    Command::Analyze {
      academia,
      jugador,
      days,
      live,
    } => {
      let live_exercises: Vec<LoggedExercise> = match live {
        Some(path) => read_json(&path)?,
        None => Vec::new(),
      };
      let result =
        analysis::get_planning_analysis(&state, academia, jugador, days, live_exercises).await;
      print_json(&result)?;
    }
    Command::ImportPlan { file } => {
      let training_plan: TrainingPlan = read_json(&file)?;
      let saved = plan::save_training_plan(&state, training_plan).await?;
      tracing::info!(plan_id = %saved.id, "plan imported");
      print_json(&saved)?;
    }
    Command::ImportSession { file } => {
      let session: TrainingSession = read_json(&file)?;
      let saved = commands::record_session(&state, session).await?;
      tracing::info!(session_id = %saved.id, "session imported");
    }
    Command::Sessions {
      academia,
      jugador,
      days,
    } => {
      let sessions = commands::list_sessions(&state, &academia, &jugador, days).await?;
      print_json(&sessions)?;
    }
  }

  state.db.close().await;
  Ok(())
}
