pub mod model;
pub mod parser;
pub mod tracker;

pub use model::{SequencedEvent, StreamEvent, TerminalEvent};
pub use parser::StreamJsonEventParser;
pub use tracker::{ToolUseRecord, ToolUseTracker};
