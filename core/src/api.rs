//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `subagent_core::api` instead of reaching into internal modules.

pub use crate::backend::{BackendPlan, BackendStrategy};
pub use crate::config::{
    child_env, env_snapshot, load_from_env, parse_allowed_tools, AppConfig,
    BackendConfig, ControlConfig, Credentials, LogsConfig, Run,
};
pub use crate::engine::{run_subagent, RunInput, RunReport};
pub use crate::error::{CliError, ConfigError, RunnerError};
pub use crate::logs::LogPaths;
pub use crate::progress::{lines, ProgressSink};
pub use crate::result::SubagentResult;
pub use crate::runner::{RunnerStartArgs, Termination};
pub use crate::stream_event::ToolUseRecord;
