pub mod run;
pub mod types;

pub use run::Exerciser;
pub use types::{DEFAULT_HIGHLIGHT_STYLE, ExerciserConfig, RunError, RunReport, RunResult, RunSnapshot};
