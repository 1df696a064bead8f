//! Input controls: declarations, current values, change detection.
pub mod store;

pub use store::{
    ChangedSignals, SignalError, SignalKind, SignalSnapshot, SignalSpec, SignalStore, SignalValue,
};
