mod exit;
mod run;
mod shutdown;
mod spawn;
mod tee;
mod types;

pub use exit::exit_code_of;
pub use run::{run_session, RunSessionArgs};
pub use shutdown::shutdown;
pub use spawn::spawn;
pub use tee::pump;
pub use types::{RunnerResult, RunnerStartArgs, Termination};
