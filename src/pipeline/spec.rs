//! Declarative descriptions of table transformations.
//!
//! An `AggregationSpec` is a pure value: running it twice over the same input
//! yields the same output, independent of call order. Stages apply in a fixed
//! order (filter, derive, group/aggregate, melt, sort) and any stage may be
//! absent.

use crate::error::CoreError;
use crate::frame::Value;

/// A small expression tree over field values, used by filters and derived
/// columns (e.g. `season_start < draft_year + 7`).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Field(String),
    Literal(Value),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn field(name: &str) -> Expr {
        Expr::Field(name.to_string())
    }

    pub fn lit(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    pub fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }

    pub fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }

    /// Collects every field name the expression references.
    pub fn referenced_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Field(name) => out.push(name),
            Expr::Literal(_) => {}
            Expr::Add(lhs, rhs) | Expr::Sub(lhs, rhs) => {
                lhs.referenced_fields(out);
                rhs.referenced_fields(out);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

/// A static row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Numeric comparison between two expressions.
    Compare { lhs: Expr, cmp: Cmp, rhs: Expr },
    /// Membership of a field value in a fixed set.
    OneOf { field: String, options: Vec<Value> },
}

impl Predicate {
    pub fn compare(lhs: Expr, cmp: Cmp, rhs: Expr) -> Predicate {
        Predicate::Compare { lhs, cmp, rhs }
    }

    pub fn one_of(field: &str, options: Vec<Value>) -> Predicate {
        Predicate::OneOf { field: field.to_string(), options }
    }

    pub fn referenced_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { lhs, rhs, .. } => {
                lhs.referenced_fields(out);
                rhs.referenced_fields(out);
            }
            Predicate::OneOf { field, .. } => out.push(field),
        }
    }
}

/// How a non-key field reduces within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
    Sum,
    Mean,
    /// First row encountered in the input's iteration order.
    First,
}

impl Aggregator {
    /// Parses an aggregator name as it appears in configuration text.
    pub fn parse(name: &str) -> Result<Aggregator, CoreError> {
        match name {
            "sum" => Ok(Aggregator::Sum),
            "mean" => Ok(Aggregator::Mean),
            "first" => Ok(Aggregator::First),
            other => Err(CoreError::config(format!(
                "unknown aggregator '{}' (expected sum, mean, or first)",
                other
            ))),
        }
    }
}

/// One reduced output field of a group stage. The output keeps the input
/// field's name.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateField {
    pub field: String,
    pub agg: Aggregator,
}

impl AggregateField {
    pub fn new(field: &str, agg: Aggregator) -> Self {
        Self { field: field.to_string(), agg }
    }
}

/// A computed column appended before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedField {
    pub name: String,
    pub expr: Expr,
}

impl DerivedField {
    pub fn new(name: &str, expr: Expr) -> Self {
        Self { name: name.to_string(), expr }
    }
}

/// Wide-to-long reshape: one output row per (input row, value field), tagged
/// with the value field's name in `variable_field`.
#[derive(Debug, Clone, PartialEq)]
pub struct Melt {
    pub id_fields: Vec<String>,
    pub value_fields: Vec<String>,
    pub variable_field: String,
    pub value_field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Stable sort by one field; ties keep their original row order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

impl SortKey {
    pub fn ascending(field: &str) -> Self {
        Self { field: field.to_string(), direction: Direction::Ascending }
    }

    pub fn descending(field: &str) -> Self {
        Self { field: field.to_string(), direction: Direction::Descending }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregationSpec {
    pub filter: Option<Predicate>,
    pub derive: Vec<DerivedField>,
    pub group_by: Vec<String>,
    pub aggregates: Vec<AggregateField>,
    pub melt: Option<Melt>,
    pub sort: Option<SortKey>,
}
