//! Reactive analytics core for the draft-pick value dashboard.
//!
//! The crate computes a fixed set of derived views from a static dataset and
//! re-derives the reactive ones when an input control changes. It owns the
//! aggregation pipelines, the signal store, the dependency graph, and the
//! recomputation scheduler; rendering and transport sit behind the
//! [`runtime::OutputSink`] boundary.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod frame;
pub mod graph;
pub mod ingest;
pub mod pipeline;
pub mod runtime;
pub mod signal;
pub mod view;

pub use error::CoreError;
