pub mod evaluation;
pub mod plan;
pub mod session;

pub use evaluation::{migrate_evaluation, GeneralEvaluation, StoredEvaluation};
pub use plan::{PlannedArea, PlannedExercise, PlannedType, Planificacion, TrainingPlan};
pub use session::{LoggedExercise, TrainingSession};
