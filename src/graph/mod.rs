//! The declarative dependency graph from signals to derived views.
pub mod binding;
pub mod dependency;

pub use binding::{Binding, RecomputeFn};
pub use dependency::{BindingId, DependencyGraph};
