//! Supervisor core for running a code CLI agent as a one-shot sub-agent.
//!
//! The crate is split along the lifecycle of a single run:
//! - `runner` spawns the agent, closes its stdin, tees its output and owns
//!   its lifetime (wait / terminate / kill / timeout)
//! - `stream_event` classifies the agent's newline-delimited JSON stream
//! - `logs` persists the raw and structured output of a run
//! - `result` folds whatever happened into the single JSON result
//! - `engine` ties the pieces together behind `run_subagent`

pub mod api;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod logs;
pub mod progress;
pub mod result;
pub mod runner;
pub mod stream_event;
pub mod util;
