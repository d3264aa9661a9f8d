use std::collections::HashMap;
use std::path::PathBuf;

use super::types::AppConfig;

pub const LOG_DIR_VAR: &str = "SUBAGENT_LOG_DIR";
pub const AGENT_BIN_VAR: &str = "SUBAGENT_AGENT_BIN";

/// The process environment as a map. Entries that are not valid UTF-8 are skipped.
pub fn env_snapshot() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Defaults plus overrides from an environment snapshot.
pub fn load_from_env(env: &HashMap<String, String>) -> AppConfig {
    let mut cfg = AppConfig::default();

    if let Some(v) = env.get(LOG_DIR_VAR) {
        if !v.trim().is_empty() {
            cfg.logs.dir = PathBuf::from(v.trim());
        }
    }
    if let Some(v) = env.get(AGENT_BIN_VAR) {
        if !v.trim().is_empty() {
            cfg.backend.bin = v.trim().to_string();
        }
    }

    cfg
}
