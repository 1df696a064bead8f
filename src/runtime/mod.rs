//! Recomputation scheduling, session state, and the sink boundary.
pub mod scheduler;
pub mod session;
pub mod sink;

pub use scheduler::Scheduler;
pub use session::{InteractionEvent, Session};
pub use sink::{JsonLineSink, MemorySink, OutputSink};
