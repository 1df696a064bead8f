//! Immutable columnar tables and their typed scalar values.
pub mod schema;
pub mod table;
pub mod value;

pub use schema::{Field, Schema};
pub use table::{Column, Frame, FrameBuilder};
pub use value::{FieldType, Value};
