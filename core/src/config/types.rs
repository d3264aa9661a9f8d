use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub logs: LogsConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

/// Lifecycle knobs for the supervised child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Time between SIGTERM and SIGKILL when the child has to be stopped.
    #[serde(default = "default_terminate_grace_ms")]
    pub terminate_grace_ms: u64,

    /// Time to wait for the child to be reaped after SIGKILL.
    #[serde(default = "default_kill_wait_ms")]
    pub kill_wait_ms: u64,

    /// Time the output pumps get to reach EOF once the run is decided.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,

    /// Time the child may keep running after it emitted its terminal event.
    #[serde(default = "default_post_result_grace_ms")]
    pub post_result_grace_ms: u64,

    /// Size of the stdout/stderr tail rings kept in memory.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    /// Time the progress sink gets to catch up once the run is decided.
    #[serde(default = "default_progress_wait_ms")]
    pub progress_wait_ms: u64,
}

fn default_terminate_grace_ms() -> u64 {
    5_000
}

fn default_kill_wait_ms() -> u64 {
    2_000
}

fn default_drain_grace_ms() -> u64 {
    2_000
}

fn default_post_result_grace_ms() -> u64 {
    5_000
}

fn default_capture_bytes() -> usize {
    65_536
}

fn default_progress_wait_ms() -> u64 {
    2_000
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            terminate_grace_ms: default_terminate_grace_ms(),
            kill_wait_ms: default_kill_wait_ms(),
            drain_grace_ms: default_drain_grace_ms(),
            post_result_grace_ms: default_post_result_grace_ms(),
            capture_bytes: default_capture_bytes(),
            progress_wait_ms: default_progress_wait_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default)]
    pub drop_when_full: bool,

    #[serde(default = "default_debug_log")]
    pub debug_log: PathBuf,
}

fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join("glm-native-subagent")
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_debug_log() -> PathBuf {
    std::env::temp_dir().join("glm-subagent-debug.log")
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            channel_capacity: default_channel_capacity(),
            drop_when_full: false,
            debug_log: default_debug_log(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_bin")]
    pub bin: String,

    #[serde(default = "default_base_url")]
    pub default_base_url: String,

    #[serde(default = "default_api_timeout_ms")]
    pub api_timeout_ms: String,
}

fn default_bin() -> String {
    "claude".to_string()
}

fn default_base_url() -> String {
    "https://api.z.ai/api/anthropic".to_string()
}

fn default_api_timeout_ms() -> String {
    "300000".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            bin: default_bin(),
            default_base_url: default_base_url(),
            api_timeout_ms: default_api_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_falls_back_to_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.control.terminate_grace_ms, 5_000);
        assert_eq!(cfg.control.capture_bytes, 65_536);
        assert_eq!(cfg.logs.channel_capacity, 1024);
        assert!(!cfg.logs.drop_when_full);
        assert_eq!(cfg.backend.bin, "claude");
        assert!(cfg.logs.dir.ends_with("glm-native-subagent"));
    }

    #[test]
    fn partial_control_section_keeps_other_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"control":{"terminate_grace_ms":10}}"#).unwrap();
        assert_eq!(cfg.control.terminate_grace_ms, 10);
        assert_eq!(cfg.control.drain_grace_ms, 2_000);
        assert_eq!(cfg.control.progress_wait_ms, 2_000);
    }
}
