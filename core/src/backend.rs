use std::collections::HashMap;

use anyhow::Result;

use crate::config::{AppConfig, Run};
use crate::runner::RunnerStartArgs;

pub struct BackendPlan {
    pub session_args: RunnerStartArgs,
}

/// Turns a `Run` into the concrete command line of one agent CLI.
pub trait BackendStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn plan(&self, run: &Run, envs: HashMap<String, String>, cfg: &AppConfig) -> Result<BackendPlan>;
}
