//! Concrete strategies injected into `subagent-core`: the agent CLI
//! backend and the progress sinks.

pub mod backend;
pub mod factory;
pub mod progress;
