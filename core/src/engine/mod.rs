mod run;
mod types;

pub use run::run_subagent;
pub use types::{RunInput, RunReport};
