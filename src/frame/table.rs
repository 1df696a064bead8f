//! Columnar table storage.
//!
//! A `Frame` is the in-memory representation of the dataset and of every
//! pipeline output: a schema plus one typed column per field, all columns the
//! same length. Frames are immutable once built; transformations produce new
//! frames.

use super::schema::{Field, Schema};
use super::value::{FieldType, Value};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Str(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Column::Int(_) => FieldType::Int,
            Column::Float(_) => FieldType::Float,
            Column::Str(_) => FieldType::Str,
        }
    }

    pub fn empty(ty: FieldType) -> Self {
        match ty {
            FieldType::Int => Column::Int(Vec::new()),
            FieldType::Float => Column::Float(Vec::new()),
            FieldType::Str => Column::Str(Vec::new()),
        }
    }

    pub fn value(&self, row: usize) -> Value {
        match self {
            Column::Int(v) => Value::Int(v[row]),
            Column::Float(v) => Value::Float(v[row]),
            Column::Str(v) => Value::Str(v[row].clone()),
        }
    }

    pub fn f64_at(&self, row: usize) -> Option<f64> {
        match self {
            Column::Int(v) => Some(v[row] as f64),
            Column::Float(v) => Some(v[row]),
            Column::Str(_) => None,
        }
    }

    pub fn int_at(&self, row: usize) -> Option<i64> {
        match self {
            Column::Int(v) => Some(v[row]),
            _ => None,
        }
    }

    pub fn str_at(&self, row: usize) -> Option<&str> {
        match self {
            Column::Str(v) => Some(&v[row]),
            _ => None,
        }
    }

    /// Builds a new column from the given row indices, in order.
    pub fn gather(&self, rows: &[usize]) -> Column {
        match self {
            Column::Int(v) => Column::Int(rows.iter().map(|&r| v[r]).collect()),
            Column::Float(v) => Column::Float(rows.iter().map(|&r| v[r]).collect()),
            Column::Str(v) => Column::Str(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }

    /// Appends a value of the column's own type. Mixed-type pushes are a
    /// construction bug upstream, reported as a configuration error.
    pub fn push(&mut self, value: Value) -> Result<(), CoreError> {
        match (self, value) {
            (Column::Int(v), Value::Int(x)) => v.push(x),
            (Column::Float(v), Value::Float(x)) => v.push(x),
            (Column::Float(v), Value::Int(x)) => v.push(x as f64),
            (Column::Str(v), Value::Str(x)) => v.push(x),
            (col, value) => {
                return Err(CoreError::config(format!(
                    "cannot push {:?} value into {:?} column",
                    value.field_type(),
                    col.field_type()
                )))
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    schema: Schema,
    columns: Vec<Column>,
    rows: usize,
}

impl Frame {
    /// Assembles a frame, checking that the columns line up with the schema.
    pub fn new(schema: Schema, columns: Vec<Column>) -> Result<Self, CoreError> {
        if schema.len() != columns.len() {
            return Err(CoreError::config(format!(
                "schema declares {} fields but {} columns were provided",
                schema.len(),
                columns.len()
            )));
        }
        let rows = columns.first().map_or(0, Column::len);
        for (i, col) in columns.iter().enumerate() {
            let field = schema.field(i);
            if col.field_type() != field.ty {
                return Err(CoreError::config(format!(
                    "column '{}' declared {:?} but stores {:?}",
                    field.name,
                    field.ty,
                    col.field_type()
                )));
            }
            if col.len() != rows {
                return Err(CoreError::config(format!(
                    "column '{}' has {} rows, expected {}",
                    field.name,
                    col.len(),
                    rows
                )));
            }
        }
        Ok(Self { schema, columns, rows })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.schema.index_of(name).map(|i| &self.columns[i])
    }

    pub fn value(&self, row: usize, col: usize) -> Value {
        self.columns[col].value(row)
    }

    /// A frame with the same schema and no rows.
    pub fn empty_like(&self) -> Frame {
        let columns = self
            .schema
            .fields()
            .iter()
            .map(|f| Column::empty(f.ty))
            .collect();
        Frame { schema: self.schema.clone(), columns, rows: 0 }
    }

    /// Keeps the rows for which `keep` returns true, preserving order.
    pub fn retain_rows<F: FnMut(usize) -> bool>(&self, mut keep: F) -> Frame {
        let rows: Vec<usize> = (0..self.rows).filter(|&r| keep(r)).collect();
        self.take_rows(&rows)
    }

    /// Builds a new frame from the given row indices, in order.
    pub fn take_rows(&self, rows: &[usize]) -> Frame {
        let columns = self.columns.iter().map(|c| c.gather(rows)).collect();
        Frame { schema: self.schema.clone(), columns, rows: rows.len() }
    }
}

/// Column-at-a-time frame construction, used by ingest and by tests.
#[derive(Debug, Default)]
pub struct FrameBuilder {
    fields: Vec<Field>,
    columns: Vec<Column>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_int(mut self, name: &str, values: Vec<i64>) -> Self {
        self.fields.push(Field::new(name, FieldType::Int));
        self.columns.push(Column::Int(values));
        self
    }

    pub fn with_float(mut self, name: &str, values: Vec<f64>) -> Self {
        self.fields.push(Field::new(name, FieldType::Float));
        self.columns.push(Column::Float(values));
        self
    }

    pub fn with_str(mut self, name: &str, values: Vec<&str>) -> Self {
        self.fields.push(Field::new(name, FieldType::Str));
        self.columns
            .push(Column::Str(values.into_iter().map(String::from).collect()));
        self
    }

    pub fn with_strings(mut self, name: &str, values: Vec<String>) -> Self {
        self.fields.push(Field::new(name, FieldType::Str));
        self.columns.push(Column::Str(values));
        self
    }

    pub fn finish(self) -> Result<Frame, CoreError> {
        Frame::new(Schema::new(self.fields), self.columns)
    }
}
