mod assemble;
mod model;

pub use assemble::assemble;
pub use model::SubagentResult;
