//! Executes an `AggregationSpec` against a frame.
//!
//! `Pipeline::run` is a pure function over immutable inputs: it never mutates
//! the source frame and produces the same output for the same input every
//! time. Field references are resolved against the frame's schema by name and
//! fail with a `Schema` error before any rows move.

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::spec::{
    AggregateField, AggregationSpec, Aggregator, Cmp, Direction, Expr, Melt, Predicate, SortKey,
};
use crate::error::CoreError;
use crate::frame::{Column, Field, FieldType, Frame, Schema, Value};

/// Hashable group key atom. Floats key by bit pattern, the same trick the
/// incremental-viz executors use, so keys stay `Eq + Hash` without ordering
/// caveats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyAtom {
    Int(i64),
    Bits(u64),
    Str(String),
}

type GroupKey = SmallVec<[KeyAtom; 2]>;

fn key_atom(value: &Value) -> KeyAtom {
    match value {
        Value::Int(i) => KeyAtom::Int(*i),
        Value::Float(f) => KeyAtom::Bits(f.to_bits()),
        Value::Str(s) => KeyAtom::Str(s.clone()),
    }
}

enum Acc {
    Sum(f64),
    Mean { sum: f64, count: u64 },
    First(Value),
}

pub struct Pipeline;

impl Pipeline {
    /// Runs every declared stage in order: filter, derive, group/aggregate,
    /// melt, sort.
    pub fn run(frame: &Frame, spec: &AggregationSpec) -> Result<Frame, CoreError> {
        let mut current = match &spec.filter {
            Some(predicate) => Self::apply_filter(frame, predicate)?,
            None => frame.clone(),
        };

        for derived in &spec.derive {
            current = Self::apply_derive(&current, &derived.name, &derived.expr)?;
        }

        if !spec.group_by.is_empty() || !spec.aggregates.is_empty() {
            current = Self::apply_group(&current, &spec.group_by, &spec.aggregates)?;
        }

        if let Some(melt) = &spec.melt {
            current = Self::apply_melt(&current, melt)?;
        }

        if let Some(sort) = &spec.sort {
            current = Self::apply_sort(&current, sort)?;
        }

        Ok(current)
    }

    // --- Stages ---

    fn apply_filter(frame: &Frame, predicate: &Predicate) -> Result<Frame, CoreError> {
        // Resolve references once before scanning rows.
        let mut fields = Vec::new();
        predicate.referenced_fields(&mut fields);
        for name in fields {
            frame.schema().require(name, "filter predicate")?;
        }

        let mut rows = Vec::new();
        for row in 0..frame.row_count() {
            if Self::eval_predicate(frame, row, predicate)? {
                rows.push(row);
            }
        }
        Ok(frame.take_rows(&rows))
    }

    fn apply_derive(frame: &Frame, name: &str, expr: &Expr) -> Result<Frame, CoreError> {
        let mut refs = Vec::new();
        expr.referenced_fields(&mut refs);
        for field in refs {
            frame.schema().require(field, "derived field")?;
        }

        let mut values = Vec::with_capacity(frame.row_count());
        for row in 0..frame.row_count() {
            values.push(Self::eval_expr(frame, row, expr)?);
        }

        let mut fields: Vec<Field> = frame.schema().fields().to_vec();
        fields.push(Field::new(name, FieldType::Float));
        let mut columns: Vec<Column> = (0..frame.schema().len())
            .map(|i| frame.column(i).clone())
            .collect();
        columns.push(Column::Float(values));
        Frame::new(Schema::new(fields), columns)
    }

    fn apply_group(
        frame: &Frame,
        group_by: &[String],
        aggregates: &[AggregateField],
    ) -> Result<Frame, CoreError> {
        let key_idx: Vec<usize> = group_by
            .iter()
            .map(|name| frame.schema().require(name, "group-by"))
            .collect::<Result<_, _>>()?;

        let mut agg_idx = Vec::with_capacity(aggregates.len());
        for agg in aggregates {
            let idx = frame.schema().require(&agg.field, "aggregate")?;
            let ty = frame.schema().field(idx).ty;
            if matches!(agg.agg, Aggregator::Sum | Aggregator::Mean) && ty == FieldType::Str {
                return Err(CoreError::config(format!(
                    "aggregator {:?} requires a numeric field, but '{}' is a string",
                    agg.agg, agg.field
                )));
            }
            agg_idx.push((idx, agg.agg));
        }

        // One pass over the input. Group output order is the order of first
        // appearance of each key, which also makes `First` well-defined.
        let mut groups: HashMap<GroupKey, usize> = HashMap::new();
        let mut key_values: Vec<SmallVec<[Value; 2]>> = Vec::new();
        let mut accs: Vec<Vec<Acc>> = Vec::new();

        for row in 0..frame.row_count() {
            let mut key: GroupKey = SmallVec::new();
            for &k in &key_idx {
                key.push(key_atom(&frame.value(row, k)));
            }

            let group = match groups.get(&key).copied() {
                Some(g) => g,
                None => {
                    let g = accs.len();
                    groups.insert(key, g);
                    key_values.push(key_idx.iter().map(|&k| frame.value(row, k)).collect());
                    accs.push(
                        agg_idx
                            .iter()
                            .map(|&(idx, agg)| match agg {
                                Aggregator::Sum => Acc::Sum(0.0),
                                Aggregator::Mean => Acc::Mean { sum: 0.0, count: 0 },
                                Aggregator::First => Acc::First(frame.value(row, idx)),
                            })
                            .collect(),
                    );
                    g
                }
            };

            for (slot, &(idx, _)) in accs[group].iter_mut().zip(&agg_idx) {
                match slot {
                    Acc::Sum(total) => {
                        // Checked above: sum/mean fields are numeric.
                        *total += frame.column(idx).f64_at(row).unwrap_or(0.0);
                    }
                    Acc::Mean { sum, count } => {
                        *sum += frame.column(idx).f64_at(row).unwrap_or(0.0);
                        *count += 1;
                    }
                    Acc::First(_) => {}
                }
            }
        }

        // Assemble output: key fields first, then one column per aggregate.
        let mut fields = Vec::with_capacity(key_idx.len() + agg_idx.len());
        let mut columns = Vec::with_capacity(key_idx.len() + agg_idx.len());

        for (pos, &k) in key_idx.iter().enumerate() {
            let field = frame.schema().field(k).clone();
            let mut col = Column::empty(field.ty);
            for key in &key_values {
                col.push(key[pos].clone())?;
            }
            fields.push(field);
            columns.push(col);
        }

        for (pos, (agg, &(idx, _))) in aggregates.iter().zip(&agg_idx).enumerate() {
            let ty = match agg.agg {
                Aggregator::Sum | Aggregator::Mean => FieldType::Float,
                Aggregator::First => frame.schema().field(idx).ty,
            };
            let mut col = Column::empty(ty);
            for group in &accs {
                let value = match &group[pos] {
                    Acc::Sum(total) => Value::Float(*total),
                    Acc::Mean { sum, count } => Value::Float(sum / *count as f64),
                    Acc::First(v) => v.clone(),
                };
                col.push(value)?;
            }
            fields.push(Field::new(&agg.field, ty));
            columns.push(col);
        }

        Frame::new(Schema::new(fields), columns)
    }

    fn apply_melt(frame: &Frame, melt: &Melt) -> Result<Frame, CoreError> {
        let id_idx: Vec<usize> = melt
            .id_fields
            .iter()
            .map(|name| frame.schema().require(name, "melt id field"))
            .collect::<Result<_, _>>()?;
        let value_idx: Vec<usize> = melt
            .value_fields
            .iter()
            .map(|name| frame.schema().require(name, "melt value field"))
            .collect::<Result<_, _>>()?;
        for (&idx, name) in value_idx.iter().zip(&melt.value_fields) {
            if frame.schema().field(idx).ty == FieldType::Str {
                return Err(CoreError::config(format!(
                    "melt value field '{}' must be numeric",
                    name
                )));
            }
        }

        let rows = frame.row_count();
        let long_rows = rows * value_idx.len();

        let mut fields: Vec<Field> = id_idx
            .iter()
            .map(|&i| frame.schema().field(i).clone())
            .collect();
        fields.push(Field::new(&melt.variable_field, FieldType::Str));
        fields.push(Field::new(&melt.value_field, FieldType::Float));

        // Variable-major: all rows of the first value field, then the next.
        // Input row order is preserved within each variable.
        let mut columns: Vec<Column> = id_idx
            .iter()
            .map(|&i| Column::empty(frame.schema().field(i).ty))
            .collect();
        let mut variable = Vec::with_capacity(long_rows);
        let mut value = Vec::with_capacity(long_rows);

        for (&v_idx, v_name) in value_idx.iter().zip(&melt.value_fields) {
            for row in 0..rows {
                for (col, &i) in columns.iter_mut().zip(&id_idx) {
                    col.push(frame.value(row, i))?;
                }
                variable.push(v_name.clone());
                value.push(frame.column(v_idx).f64_at(row).unwrap_or(f64::NAN));
            }
        }

        columns.push(Column::Str(variable));
        columns.push(Column::Float(value));
        Frame::new(Schema::new(fields), columns)
    }

    fn apply_sort(frame: &Frame, key: &SortKey) -> Result<Frame, CoreError> {
        let idx = frame.schema().require(&key.field, "sort key")?;
        let col = frame.column(idx);

        let mut rows: Vec<usize> = (0..frame.row_count()).collect();
        // Stable sort: equal keys keep their original row order.
        rows.sort_by(|&a, &b| {
            let ord = Self::cmp_cells(col, a, b);
            match key.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
        Ok(frame.take_rows(&rows))
    }

    // --- Evaluation helpers ---

    fn cmp_cells(col: &Column, a: usize, b: usize) -> Ordering {
        match col {
            Column::Int(v) => v[a].cmp(&v[b]),
            Column::Float(v) => v[a].total_cmp(&v[b]),
            Column::Str(v) => v[a].cmp(&v[b]),
        }
    }

    fn eval_predicate(frame: &Frame, row: usize, predicate: &Predicate) -> Result<bool, CoreError> {
        match predicate {
            Predicate::Compare { lhs, cmp, rhs } => {
                let l = Self::eval_expr(frame, row, lhs)?;
                let r = Self::eval_expr(frame, row, rhs)?;
                Ok(match cmp {
                    Cmp::Lt => l < r,
                    Cmp::Le => l <= r,
                    Cmp::Eq => l == r,
                    Cmp::Ge => l >= r,
                    Cmp::Gt => l > r,
                })
            }
            Predicate::OneOf { field, options } => {
                let idx = frame.schema().require(field, "filter predicate")?;
                let cell = frame.value(row, idx);
                Ok(options.iter().any(|opt| *opt == cell))
            }
        }
    }

    fn eval_expr(frame: &Frame, row: usize, expr: &Expr) -> Result<f64, CoreError> {
        match expr {
            Expr::Field(name) => {
                let idx = frame.schema().require(name, "expression")?;
                frame.column(idx).f64_at(row).ok_or_else(|| {
                    CoreError::config(format!("field '{}' is not numeric", name))
                })
            }
            Expr::Literal(value) => value
                .as_f64()
                .ok_or_else(|| CoreError::config("non-numeric literal in expression")),
            Expr::Add(lhs, rhs) => {
                Ok(Self::eval_expr(frame, row, lhs)? + Self::eval_expr(frame, row, rhs)?)
            }
            Expr::Sub(lhs, rhs) => {
                Ok(Self::eval_expr(frame, row, lhs)? - Self::eval_expr(frame, row, rhs)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::spec::DerivedField;

    // Small fixture shared by the stage tests.
    fn seasons() -> Frame {
        crate::frame::FrameBuilder::new()
            .with_str("player", vec!["Kane", "Kane", "Stamkos", "Stamkos"])
            .with_int("draft_year", vec![2007, 2007, 2008, 2008])
            .with_int("pick", vec![1, 1, 1, 1])
            .with_int("season_start", vec![2007, 2008, 2008, 2020])
            .with_float("prediction", vec![2.0, 3.0, 4.0, 1.0])
            .with_float("point_shares", vec![3.5, 2.5, 6.0, 0.5])
            .finish()
            .unwrap()
    }

    #[test]
    fn test_run_is_deterministic() {
        let frame = seasons();
        let spec = AggregationSpec {
            group_by: vec!["player".into()],
            aggregates: vec![
                AggregateField::new("prediction", Aggregator::Sum),
                AggregateField::new("point_shares", Aggregator::Mean),
            ],
            sort: Some(SortKey::descending("prediction")),
            ..Default::default()
        };

        let once = Pipeline::run(&frame, &spec).unwrap();
        let twice = Pipeline::run(&frame, &spec).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_group_sum_preserves_total_mass() {
        let frame = seasons();
        let spec = AggregationSpec {
            group_by: vec!["player".into()],
            aggregates: vec![AggregateField::new("prediction", Aggregator::Sum)],
            ..Default::default()
        };
        let grouped = Pipeline::run(&frame, &spec).unwrap();

        let total_in: f64 = (0..frame.row_count())
            .map(|r| frame.column(4).f64_at(r).unwrap())
            .sum();
        let col = grouped.column_by_name("prediction").unwrap();
        let total_out: f64 = (0..grouped.row_count()).map(|r| col.f64_at(r).unwrap()).sum();
        assert!((total_in - total_out).abs() < 1e-9);
    }

    #[test]
    fn test_group_order_is_first_appearance_and_first_agg() {
        let frame = crate::frame::FrameBuilder::new()
            .with_str("player", vec!["B", "A", "B", "A"])
            .with_int("pick", vec![10, 20, 11, 21])
            .finish()
            .unwrap();
        let spec = AggregationSpec {
            group_by: vec!["player".into()],
            aggregates: vec![AggregateField::new("pick", Aggregator::First)],
            ..Default::default()
        };
        let grouped = Pipeline::run(&frame, &spec).unwrap();

        assert_eq!(grouped.row_count(), 2);
        // "B" appears first in the input, so it leads the output.
        assert_eq!(grouped.value(0, 0), Value::Str("B".into()));
        assert_eq!(grouped.value(0, 1), Value::Int(10));
        assert_eq!(grouped.value(1, 0), Value::Str("A".into()));
        assert_eq!(grouped.value(1, 1), Value::Int(20));
    }

    #[test]
    fn test_filter_to_empty_is_not_an_error() {
        let frame = seasons();
        let spec = AggregationSpec {
            filter: Some(Predicate::compare(
                Expr::field("draft_year"),
                Cmp::Gt,
                Expr::lit(3000),
            )),
            ..Default::default()
        };
        let out = Pipeline::run(&frame, &spec).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.schema(), frame.schema());
    }

    #[test]
    fn test_filter_field_plus_offset() {
        // season_start < draft_year + 7 keeps the RFA-period seasons only.
        let frame = seasons();
        let spec = AggregationSpec {
            filter: Some(Predicate::compare(
                Expr::field("season_start"),
                Cmp::Lt,
                Expr::field("draft_year").add(Expr::lit(7)),
            )),
            ..Default::default()
        };
        let out = Pipeline::run(&frame, &spec).unwrap();
        // The 2020 Stamkos season (12 years after a 2008 draft) drops.
        assert_eq!(out.row_count(), 3);
    }

    #[test]
    fn test_derive_residual() {
        let frame = seasons();
        let spec = AggregationSpec {
            derive: vec![DerivedField::new(
                "residual",
                Expr::field("point_shares").sub(Expr::field("prediction")),
            )],
            ..Default::default()
        };
        let out = Pipeline::run(&frame, &spec).unwrap();
        let col = out.column_by_name("residual").unwrap();
        assert_eq!(col.f64_at(0), Some(1.5));
        assert_eq!(col.f64_at(3), Some(-0.5));
    }

    #[test]
    fn test_melt_emits_one_row_per_pair_in_variable_major_order() {
        let frame = seasons();
        let spec = AggregationSpec {
            melt: Some(Melt {
                id_fields: vec!["player".into(), "season_start".into()],
                value_fields: vec!["prediction".into(), "point_shares".into()],
                variable_field: "variable".into(),
                value_field: "value".into(),
            }),
            ..Default::default()
        };
        let out = Pipeline::run(&frame, &spec).unwrap();

        assert_eq!(out.row_count(), 8);
        let var = out.column_by_name("variable").unwrap();
        // All prediction rows first, preserving input order within the block.
        assert_eq!(var.str_at(0), Some("prediction"));
        assert_eq!(var.str_at(3), Some("prediction"));
        assert_eq!(var.str_at(4), Some("point_shares"));
        let value = out.column_by_name("value").unwrap();
        assert_eq!(value.f64_at(0), Some(2.0));
        assert_eq!(value.f64_at(4), Some(3.5));
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let frame = crate::frame::FrameBuilder::new()
            .with_int("year", vec![2010, 2007, 2010, 2007])
            .with_str("player", vec!["a", "b", "c", "d"])
            .finish()
            .unwrap();
        let spec = AggregationSpec {
            sort: Some(SortKey::ascending("year")),
            ..Default::default()
        };
        let out = Pipeline::run(&frame, &spec).unwrap();
        let players: Vec<_> = (0..4)
            .map(|r| out.column_by_name("player").unwrap().str_at(r).unwrap().to_string())
            .collect();
        assert_eq!(players, vec!["b", "d", "a", "c"]);

        let desc = AggregationSpec {
            sort: Some(SortKey::descending("year")),
            ..Default::default()
        };
        let out = Pipeline::run(&frame, &desc).unwrap();
        assert_eq!(out.value(0, 0), Value::Int(2010));
    }

    #[test]
    fn test_missing_field_is_schema_error() {
        let frame = seasons();
        let spec = AggregationSpec {
            group_by: vec!["team".into()],
            aggregates: vec![AggregateField::new("prediction", Aggregator::Sum)],
            ..Default::default()
        };
        let err = Pipeline::run(&frame, &spec).unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }));
    }

    #[test]
    fn test_sum_of_string_field_is_configuration_error() {
        let frame = seasons();
        let spec = AggregationSpec {
            group_by: vec!["draft_year".into()],
            aggregates: vec![AggregateField::new("player", Aggregator::Sum)],
            ..Default::default()
        };
        let err = Pipeline::run(&frame, &spec).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn test_one_of_membership_filter() {
        let frame = seasons();
        let spec = AggregationSpec {
            filter: Some(Predicate::one_of(
                "season_start",
                vec![Value::Int(2007), Value::Int(2020)],
            )),
            ..Default::default()
        };
        let out = Pipeline::run(&frame, &spec).unwrap();
        assert_eq!(out.row_count(), 2);
    }
}
