use std::collections::HashMap;

use crate::error::ConfigError;

use super::types::BackendConfig;

/// Recognised token variables, in priority order.
pub const AUTH_TOKEN_VARS: [&str; 2] = ["ANTHROPIC_AUTH_TOKEN", "ZAI_API_KEY"];

/// Recognised endpoint overrides, in priority order.
pub const BASE_URL_VARS: [&str; 2] = ["ANTHROPIC_BASE_URL", "ZAI_BASE_URL"];

const API_TIMEOUT_VAR: &str = "API_TIMEOUT_MS";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub base_url: String,
}

// Keep the token out of debug logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Credentials {
    pub fn resolve(
        env: &HashMap<String, String>,
        backend: &BackendConfig,
    ) -> Result<Self, ConfigError> {
        let token = first_non_blank(env, &AUTH_TOKEN_VARS).ok_or(ConfigError::MissingCredential)?;
        let base_url = first_non_blank(env, &BASE_URL_VARS)
            .unwrap_or_else(|| backend.default_base_url.clone());
        Ok(Self { token, base_url })
    }
}

fn first_non_blank(env: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| env.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Caller environment passed through untouched, plus the injected endpoint and token.
pub fn child_env(
    base: &HashMap<String, String>,
    creds: &Credentials,
    backend: &BackendConfig,
) -> HashMap<String, String> {
    let mut env = base.clone();
    env.insert(AUTH_TOKEN_VARS[0].to_string(), creds.token.clone());
    env.insert(BASE_URL_VARS[0].to_string(), creds.base_url.clone());
    env.entry(API_TIMEOUT_VAR.to_string())
        .or_insert_with(|| backend.api_timeout_ms.clone());
    env
}
