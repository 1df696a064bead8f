//! The derived views: their pipelines and payload builders.
//!
//! Static views are computed once from the loaded frames; the two reactive
//! builders (`summary_view`, `comparison_view`) run inside bindings with the
//! current signal values.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::frame::Frame;
use crate::ingest::fields;
use crate::pipeline::{
    AggregateField, AggregationSpec, Aggregator, Cmp, DerivedField, Expr, Melt, Pipeline,
    Predicate, SortKey,
};
use crate::view::{ColumnSpec, ViewData};

/// Long-form melt labels for the comparison view.
pub const VARIABLE: &str = "variable";
pub const VALUE: &str = "value";

/// Probability curves are drawn for this fixed set of post-draft years.
const PROBABILITY_YEARS: [i64; 5] = [0, 1, 3, 7, 10];

/// Mean prediction per (pick, years after draft) within the RFA window,
/// summed per pick: the headline value-per-pick curve.
pub fn pick_value_curve(seasons: &Frame) -> Result<ViewData, CoreError> {
    let per_year = Pipeline::run(
        seasons,
        &AggregationSpec {
            filter: Some(Predicate::compare(
                Expr::field(fields::SEASON_START),
                Cmp::Lt,
                Expr::field(fields::DRAFT_YEAR).add(Expr::lit(7)),
            )),
            group_by: vec![fields::PICK.into(), fields::YEARS_AFTER_DRAFT.into()],
            aggregates: vec![AggregateField::new(fields::PREDICTION, Aggregator::Mean)],
            ..Default::default()
        },
    )?;
    let per_pick = Pipeline::run(
        &per_year,
        &AggregationSpec {
            group_by: vec![fields::PICK.into()],
            aggregates: vec![AggregateField::new(fields::PREDICTION, Aggregator::Sum)],
            sort: Some(SortKey::ascending(fields::PICK)),
            ..Default::default()
        },
    )?;
    ViewData::series_from(&per_pick, fields::PICK, fields::PREDICTION, &[])
}

/// Mean prediction per (years after draft, round), one series per round.
pub fn pick_value_by_round(seasons: &Frame) -> Result<ViewData, CoreError> {
    let grouped = Pipeline::run(
        seasons,
        &AggregationSpec {
            group_by: vec![fields::YEARS_AFTER_DRAFT.into(), fields::ROUND.into()],
            aggregates: vec![AggregateField::new(fields::PREDICTION, Aggregator::Mean)],
            sort: Some(SortKey::ascending(fields::YEARS_AFTER_DRAFT)),
            ..Default::default()
        },
    )?;
    ViewData::series_from(
        &grouped,
        fields::YEARS_AFTER_DRAFT,
        fields::PREDICTION,
        &[fields::ROUND],
    )
}

/// A probability-over-pick curve for a handful of years after the draft.
/// `y_field` selects the NHL or star probability column.
pub fn probability_curve(probabilities: &Frame, y_field: &str) -> Result<ViewData, CoreError> {
    let filtered = Pipeline::run(
        probabilities,
        &AggregationSpec {
            filter: Some(Predicate::one_of(
                fields::YEARS_AFTER_DRAFT,
                PROBABILITY_YEARS.iter().map(|&y| y.into()).collect(),
            )),
            sort: Some(SortKey::ascending(fields::PICK)),
            ..Default::default()
        },
    )?;
    ViewData::series_from(&filtered, fields::PICK, y_field, &[fields::YEARS_AFTER_DRAFT])
}

/// Per-player career summary: first pick/year/team, summed predicted and
/// actual point shares, and the residual between them. Sorted by actual
/// point shares, best first.
pub fn player_summary_frame(seasons: &Frame) -> Result<Frame, CoreError> {
    Pipeline::run(
        seasons,
        &AggregationSpec {
            derive: vec![DerivedField::new(
                fields::RESIDUAL,
                Expr::field(fields::POINT_SHARES).sub(Expr::field(fields::PREDICTION)),
            )],
            group_by: vec![fields::PLAYER.into()],
            aggregates: vec![
                AggregateField::new(fields::PICK, Aggregator::First),
                AggregateField::new(fields::DRAFT_YEAR, Aggregator::First),
                AggregateField::new(fields::DRAFT_TEAM, Aggregator::First),
                AggregateField::new(fields::PREDICTION, Aggregator::Sum),
                AggregateField::new(fields::POINT_SHARES, Aggregator::Sum),
                AggregateField::new(fields::RESIDUAL, Aggregator::Sum),
            ],
            sort: Some(SortKey::descending(fields::POINT_SHARES)),
            ..Default::default()
        },
    )
}

pub fn summary_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::text(fields::PLAYER, "Player"),
        ColumnSpec::text(fields::DRAFT_TEAM, "Draft Team"),
        ColumnSpec::integer(fields::DRAFT_YEAR, "Draft Year"),
        ColumnSpec::integer(fields::PICK, "Pick"),
        ColumnSpec::decimal(fields::PREDICTION, "Predicted PS", 1),
        ColumnSpec::decimal(fields::POINT_SHARES, "Actual PS", 1),
        ColumnSpec::decimal(fields::RESIDUAL, "Over-Performance", 1),
    ]
}

/// The reactive player summary: the precomputed per-player frame narrowed by
/// the AND of the name substring (case-insensitive, empty = no filter) and
/// the inclusive draft-year range.
pub fn summary_view(
    summary: &Frame,
    name_filter: &str,
    draft_range: (i64, i64),
) -> Result<ViewData, CoreError> {
    let player = summary.schema().require(fields::PLAYER, "player summary")?;
    let draft_year = summary.schema().require(fields::DRAFT_YEAR, "player summary")?;
    let needle = name_filter.to_lowercase();

    let filtered = summary.retain_rows(|row| {
        let year = summary.column(draft_year).int_at(row).unwrap_or(i64::MIN);
        if year < draft_range.0 || year > draft_range.1 {
            return false;
        }
        needle.is_empty()
            || summary
                .column(player)
                .str_at(row)
                .is_some_and(|name| name.to_lowercase().contains(&needle))
    });
    ViewData::table_from(&filtered, &summary_columns())
}

/// Melted (prediction, point shares) per player season, in chronological
/// order: the backing frame for the two-player comparison.
pub fn comparison_frame(seasons: &Frame) -> Result<Frame, CoreError> {
    Pipeline::run(
        seasons,
        &AggregationSpec {
            melt: Some(Melt {
                id_fields: vec![fields::PLAYER.into(), fields::SEASON_START.into()],
                value_fields: vec![fields::PREDICTION.into(), fields::POINT_SHARES.into()],
                variable_field: VARIABLE.into(),
                value_field: VALUE.into(),
            }),
            sort: Some(SortKey::ascending(fields::SEASON_START)),
            ..Default::default()
        },
    )
}

/// The reactive comparison: both selections must exist in the dataset; the
/// result carries one series per (player, variable) pair.
pub fn comparison_view(
    comparison: &Frame,
    known_players: &HashSet<String>,
    player_a: &str,
    player_b: &str,
) -> Result<ViewData, CoreError> {
    for name in [player_a, player_b] {
        if !known_players.contains(name) {
            return Err(CoreError::lookup("player", name));
        }
    }

    let player = comparison.schema().require(fields::PLAYER, "player comparison")?;
    let filtered = comparison.retain_rows(|row| {
        comparison
            .column(player)
            .str_at(row)
            .is_some_and(|name| name == player_a || name == player_b)
    });
    ViewData::series_from(&filtered, fields::SEASON_START, VALUE, &[fields::PLAYER, VARIABLE])
}
