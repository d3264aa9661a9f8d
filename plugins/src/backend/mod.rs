pub mod claude;

pub use claude::ClaudeBackendStrategy;
