use serde::Serialize;

/// One classified event from the agent's stream-json output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    ToolUse {
        id: Option<String>,
        name: String,
    },
    ToolResult {
        tool_use_id: Option<String>,
        is_error: Option<bool>,
    },
    Terminal(TerminalEvent),
    Error {
        message: String,
    },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalEvent {
    pub success: bool,
    pub result: Option<String>,
    pub error: Option<String>,
    pub session_id: Option<String>,
}

/// An event together with the position of its JSON line in the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedEvent {
    pub seq: u64,
    pub event: StreamEvent,
}
