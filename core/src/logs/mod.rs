mod bundle;
mod writer;

pub use bundle::{LogBundle, LogPaths};
pub use writer::{start_log_writer, LogWriterHandle, LogWriterTx};
