mod batch;
mod interactive;

pub use batch::BatchProgress;
pub use interactive::InteractiveProgress;
