//! Pure aggregation pipelines over frames.
pub mod engine;
pub mod spec;

pub use engine::Pipeline;
pub use spec::{
    AggregateField, AggregationSpec, Aggregator, Cmp, DerivedField, Direction, Expr, Melt,
    Predicate, SortKey,
};
