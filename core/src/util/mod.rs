mod ring;
mod text;

pub use ring::RingBytes;
pub use text::{preview, tail_lines};
