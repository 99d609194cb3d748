pub mod aggregate;
pub mod frame;
pub mod lines;
pub mod sse;

pub use aggregate::collect_completion;
pub use frame::{DATA_PREFIX, DONE_SENTINEL, Frame, FrameStream, frames, parse_line};
pub use lines::LineSplitter;
pub use sse::{SSEEventGenerator, transform_to_sse};
