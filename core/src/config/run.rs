use std::path::PathBuf;
use std::time::Duration;

/// One invocation of the sub-agent. Built once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct Run {
    pub run_id: String,
    pub task: String,
    pub cwd: PathBuf,
    pub timeout: Duration,
    pub max_budget_usd: Option<f64>,
    pub allowed_tools: Vec<String>,
    pub stream: bool,
    pub debug: bool,
}

impl Run {
    pub fn new(task: impl Into<String>, cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            run_id: new_run_id(),
            task: task.into(),
            cwd: cwd.into(),
            timeout,
            max_budget_usd: None,
            allowed_tools: Vec::new(),
            stream: false,
            debug: false,
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_budget_usd(mut self, budget: Option<f64>) -> Self {
        self.max_budget_usd = budget;
        self
    }

    pub fn with_allowed_tools(mut self, tools: Vec<String>) -> Self {
        self.allowed_tools = tools;
        self
    }
}

fn new_run_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(10);
    id
}

pub fn parse_allowed_tools(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
