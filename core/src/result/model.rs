use serde::{Deserialize, Serialize};

/// The one document printed on stdout at the end of every run.
///
/// Exactly one of `result` / `error` is populated; the other serialises as
/// `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubagentResult {
    pub success: bool,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl SubagentResult {
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::failure(err.to_string())
    }

    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }
}
