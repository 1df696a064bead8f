//! The concrete dashboard: loaded frames, the six views, the four controls,
//! and session construction.
//!
//! `Dashboard` is the process-wide immutable context, built once during
//! initialization and shared read-only by every session. Each session gets
//! its own signal store, dependency graph, and scheduler; the heavy derived
//! frames live behind `Arc` and are shared.

pub mod controls;
pub mod views;

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::CoreError;
use crate::frame::Frame;
use crate::graph::{Binding, DependencyGraph};
use crate::ingest::fields;
use crate::runtime::{Scheduler, Session};
use crate::signal::{SignalSpec, SignalStore};
use crate::view::{ChartStyle, LegendAnchor, ViewId, ViewRegistry, ViewStyle};

// View identifiers.
pub const PICK_VALUE_CURVE: &str = "pick-value-curve";
pub const PICK_VALUE_BY_ROUND: &str = "pick-value-by-round";
pub const NHL_PROBABILITY: &str = "nhl-probability";
pub const STAR_PROBABILITY: &str = "star-probability";
pub const PLAYER_SUMMARY_TABLE: &str = "player-summary-table";
pub const PLAYER_COMPARISON: &str = "player-comparison";

pub struct Dashboard {
    registry: ViewRegistry,
    summary: Arc<Frame>,
    comparison: Arc<Frame>,
    players: Vec<String>,
    player_set: Arc<HashSet<String>>,
    draft_bounds: (i64, i64),
    picker_defaults: (String, String),
}

impl Dashboard {
    /// Runs every static pipeline, computes every view's initial payload,
    /// and validates the full configuration. Any error here is fatal: a view
    /// that cannot be produced at startup can never be produced.
    pub fn build(
        seasons: Frame,
        probabilities: Frame,
        config: AppConfig,
    ) -> Result<Dashboard, CoreError> {
        config.validate()?;
        if seasons.is_empty() {
            return Err(CoreError::config("player seasons dataset has no rows"));
        }

        let players = distinct_players(&seasons)?;
        let player_set: Arc<HashSet<String>> = Arc::new(players.iter().cloned().collect());
        let picker_defaults = (
            players[0].clone(),
            players.get(1).cloned().unwrap_or_else(|| players[0].clone()),
        );
        let draft_bounds = match config.draft_range {
            Some(bounds) => bounds,
            None => observed_draft_bounds(&seasons)?,
        };

        let summary = Arc::new(views::player_summary_frame(&seasons)?);
        let comparison = Arc::new(views::comparison_frame(&seasons)?);

        let mut registry = ViewRegistry::new();
        registry.register(
            ViewId::new(PICK_VALUE_CURVE),
            ViewStyle::Chart(
                ChartStyle::titled(
                    "Predicted Pick Value before UFA",
                    "Pick",
                    "Predicted PS Over RFA Period",
                )
                .with_y_range(-1.0, 40.0),
            ),
            views::pick_value_curve(&seasons)?,
        )?;
        registry.register(
            ViewId::new(PICK_VALUE_BY_ROUND),
            ViewStyle::Chart(ChartStyle::titled(
                "Pick Value by Year",
                "Years After Draft",
                "Predicted PS",
            )),
            views::pick_value_by_round(&seasons)?,
        )?;
        registry.register(
            ViewId::new(NHL_PROBABILITY),
            ViewStyle::Chart(
                ChartStyle::titled(
                    "Probability of Playing 21 Games or More",
                    "Pick",
                    "NHL Probability",
                )
                .with_y_range(0.0, 1.0)
                .with_legend(LegendAnchor::TopRight),
            ),
            views::probability_curve(&probabilities, fields::NHL_PROBABILITY)?,
        )?;
        registry.register(
            ViewId::new(STAR_PROBABILITY),
            ViewStyle::Chart(
                ChartStyle::titled(
                    "Probability of Having 6 PS or More in a Season",
                    "Pick",
                    "Star Probability",
                )
                .with_y_range(0.0, 1.0)
                .with_legend(LegendAnchor::TopRight),
            ),
            views::probability_curve(&probabilities, fields::STAR_PROBABILITY)?,
        )?;
        registry.register(
            ViewId::new(PLAYER_SUMMARY_TABLE),
            ViewStyle::Table(config.table.clone()),
            views::summary_view(&summary, "", draft_bounds)?,
        )?;
        registry.register(
            ViewId::new(PLAYER_COMPARISON),
            ViewStyle::Chart(ChartStyle::titled(
                "Pick Value vs. Predicted",
                "Season",
                "Point Shares",
            )),
            views::comparison_view(
                &comparison,
                &player_set,
                &picker_defaults.0,
                &picker_defaults.1,
            )?,
        )?;

        Ok(Dashboard {
            registry,
            summary,
            comparison,
            players,
            player_set,
            draft_bounds,
            picker_defaults,
        })
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Distinct players in dataset order; the option list for both pickers.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn draft_bounds(&self) -> (i64, i64) {
        self.draft_bounds
    }

    /// A fresh, isolated session over this shared context.
    pub fn session(&self) -> Result<Session, CoreError> {
        let store = SignalStore::new(self.signal_specs())?;
        let graph = DependencyGraph::build(&store, &self.registry, self.bindings())?;
        Ok(Session::new(store, Scheduler::new(graph)))
    }

    fn signal_specs(&self) -> Vec<SignalSpec> {
        let (min, max) = self.draft_bounds;
        vec![
            SignalSpec::text(controls::NAME_FILTER, ""),
            SignalSpec::range(controls::DRAFT_RANGE, min, max, (min, max)),
            SignalSpec::choice(
                controls::PLAYER_ONE,
                self.players.clone(),
                &self.picker_defaults.0,
            ),
            SignalSpec::choice(
                controls::PLAYER_TWO,
                self.players.clone(),
                &self.picker_defaults.1,
            ),
        ]
    }

    fn bindings(&self) -> Vec<Binding> {
        let summary = Arc::clone(&self.summary);
        let summary_binding = Binding::new(
            ViewId::new(PLAYER_SUMMARY_TABLE),
            vec![controls::NAME_FILTER, controls::DRAFT_RANGE],
            Box::new(move |snapshot| {
                let name_filter = snapshot.text(controls::NAME_FILTER)?;
                let draft_range = snapshot.range(controls::DRAFT_RANGE)?;
                views::summary_view(&summary, name_filter, draft_range)
            }),
        );

        let comparison = Arc::clone(&self.comparison);
        let player_set = Arc::clone(&self.player_set);
        let comparison_binding = Binding::new(
            ViewId::new(PLAYER_COMPARISON),
            vec![controls::PLAYER_ONE, controls::PLAYER_TWO],
            Box::new(move |snapshot| {
                let player_a = snapshot.choice(controls::PLAYER_ONE)?;
                let player_b = snapshot.choice(controls::PLAYER_TWO)?;
                views::comparison_view(&comparison, &player_set, player_a, player_b)
            }),
        );

        vec![summary_binding, comparison_binding]
    }
}

fn distinct_players(seasons: &Frame) -> Result<Vec<String>, CoreError> {
    let idx = seasons.schema().require(fields::PLAYER, "dataset")?;
    let mut seen = HashSet::new();
    let mut players = Vec::new();
    for row in 0..seasons.row_count() {
        if let Some(name) = seasons.column(idx).str_at(row) {
            if seen.insert(name.to_string()) {
                players.push(name.to_string());
            }
        }
    }
    Ok(players)
}

fn observed_draft_bounds(seasons: &Frame) -> Result<(i64, i64), CoreError> {
    let idx = seasons.schema().require(fields::DRAFT_YEAR, "dataset")?;
    let mut min = i64::MAX;
    let mut max = i64::MIN;
    for row in 0..seasons.row_count() {
        if let Some(year) = seasons.column(idx).int_at(row) {
            min = min.min(year);
            max = max.max(year);
        }
    }
    if min > max {
        return Err(CoreError::config("cannot derive draft-year bounds"));
    }
    Ok((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameBuilder, Value};
    use crate::runtime::{InteractionEvent, MemorySink};
    use crate::signal::SignalValue;
    use crate::view::ViewData;

    fn seasons() -> Frame {
        FrameBuilder::new()
            .with_str(
                "player",
                vec![
                    "Patrick Kane",
                    "Patrick Kane",
                    "Steven Stamkos",
                    "Steven Stamkos",
                ],
            )
            .with_int("draft_year", vec![2010, 2010, 2015, 2015])
            .with_int("pick", vec![5, 5, 50, 50])
            .with_str("round", vec!["1", "1", "2", "2"])
            .with_str("draft_team", vec!["CHI", "CHI", "TBL", "TBL"])
            .with_str("season", vec!["2010-11", "2011-12", "2015-16", "2016-17"])
            .with_int("season_start", vec![2010, 2011, 2015, 2016])
            .with_int("years_after_draft", vec![0, 1, 0, 1])
            .with_float("prediction", vec![2.0, 3.0, 1.0, 1.5])
            .with_float("point_shares", vec![3.0, 4.0, 0.5, 2.0])
            .finish()
            .unwrap()
    }

    fn probabilities() -> Frame {
        FrameBuilder::new()
            .with_int("pick", vec![1, 1, 2, 2])
            .with_int("years_after_draft", vec![0, 2, 0, 2])
            .with_float("nhl_probability", vec![0.9, 0.95, 0.8, 0.85])
            .with_float("star_probability", vec![0.5, 0.6, 0.3, 0.4])
            .finish()
            .unwrap()
    }

    fn config() -> AppConfig {
        AppConfig {
            draft_range: Some((2007, 2023)),
            ..Default::default()
        }
    }

    fn dashboard() -> Dashboard {
        Dashboard::build(seasons(), probabilities(), config()).unwrap()
    }

    fn table_players(data: &ViewData) -> Vec<String> {
        match data {
            ViewData::Table { rows, .. } => rows
                .iter()
                .map(|row| match &row[0] {
                    Value::Str(name) => name.clone(),
                    other => panic!("expected player name, got {:?}", other),
                })
                .collect(),
            _ => panic!("expected a table"),
        }
    }

    fn set(session: &mut Session, sink: &mut MemorySink, signal: &str, value: SignalValue) {
        session
            .apply(InteractionEvent { signal: signal.to_string(), value }, sink)
            .unwrap();
    }

    #[test]
    fn test_build_registers_all_views_with_initial_data() {
        let dashboard = dashboard();
        let ids: Vec<_> = dashboard
            .registry()
            .iter()
            .map(|(id, _)| id.as_str().to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                PICK_VALUE_CURVE,
                PICK_VALUE_BY_ROUND,
                NHL_PROBABILITY,
                STAR_PROBABILITY,
                PLAYER_SUMMARY_TABLE,
                PLAYER_COMPARISON,
            ]
        );
        for (_, entry) in dashboard.registry().iter() {
            assert!(!entry.initial.is_empty());
        }
    }

    #[test]
    fn test_initial_summary_is_sorted_by_actual_point_shares() {
        let dashboard = dashboard();
        let entry = dashboard.registry().get(&ViewId::new(PLAYER_SUMMARY_TABLE)).unwrap();
        // Kane's 7.0 summed PS beats Stamkos's 2.5.
        assert_eq!(table_players(&entry.initial), vec!["Patrick Kane", "Steven Stamkos"]);
    }

    #[test]
    fn test_draft_bounds_derive_from_dataset_without_config() {
        let dashboard =
            Dashboard::build(seasons(), probabilities(), AppConfig::default()).unwrap();
        assert_eq!(dashboard.draft_bounds(), (2010, 2015));
    }

    #[test]
    fn test_scenario_draft_range_filters_summary() {
        let dashboard = dashboard();
        let mut session = dashboard.session().unwrap();
        let mut sink = MemorySink::new();

        set(&mut session, &mut sink, controls::DRAFT_RANGE, SignalValue::Range(2012, 2020));

        let latest = sink.latest(&ViewId::new(PLAYER_SUMMARY_TABLE)).unwrap();
        assert_eq!(table_players(latest), vec!["Steven Stamkos"]);
    }

    #[test]
    fn test_scenario_name_filter_matches_case_insensitive_substring() {
        let dashboard = dashboard();
        let mut session = dashboard.session().unwrap();
        let mut sink = MemorySink::new();

        set(&mut session, &mut sink, controls::NAME_FILTER, SignalValue::text("kAn"));

        let latest = sink.latest(&ViewId::new(PLAYER_SUMMARY_TABLE)).unwrap();
        assert_eq!(table_players(latest), vec!["Patrick Kane"]);
    }

    #[test]
    fn test_name_and_range_filters_intersect() {
        let dashboard = dashboard();
        let mut session = dashboard.session().unwrap();
        let mut sink = MemorySink::new();

        // The name matches Kane, but the range excludes his draft year.
        set(&mut session, &mut sink, controls::NAME_FILTER, SignalValue::text("kan"));
        set(&mut session, &mut sink, controls::DRAFT_RANGE, SignalValue::Range(2012, 2020));

        let latest = sink.latest(&ViewId::new(PLAYER_SUMMARY_TABLE)).unwrap();
        assert!(table_players(latest).is_empty());
    }

    #[test]
    fn test_filter_to_empty_emits_valid_empty_table() {
        let dashboard = dashboard();
        let mut session = dashboard.session().unwrap();
        let mut sink = MemorySink::new();

        set(&mut session, &mut sink, controls::NAME_FILTER, SignalValue::text("zzz"));

        let latest = sink.latest(&ViewId::new(PLAYER_SUMMARY_TABLE)).unwrap();
        assert!(latest.is_empty());
        assert!(sink.errors.is_empty());
    }

    #[test]
    fn test_comparison_covers_both_selected_players() {
        // Defaults select the first two players in dataset order.
        let dashboard = dashboard();
        let entry = dashboard.registry().get(&ViewId::new(PLAYER_COMPARISON)).unwrap();
        match &entry.initial {
            ViewData::Series { points } => {
                let series: HashSet<&str> = points.iter().map(|p| p.series.as_str()).collect();
                assert_eq!(
                    series,
                    HashSet::from([
                        "Patrick Kane · prediction",
                        "Patrick Kane · point_shares",
                        "Steven Stamkos · prediction",
                        "Steven Stamkos · point_shares",
                    ])
                );
                // Two players, two seasons each, two variables.
                assert_eq!(points.len(), 8);
            }
            _ => panic!("expected a series"),
        }
    }

    #[test]
    fn test_scenario_comparison_tags_both_series_per_player() {
        let dashboard = dashboard();
        let mut session = dashboard.session().unwrap();
        let mut sink = MemorySink::new();

        set(
            &mut session,
            &mut sink,
            controls::PLAYER_ONE,
            SignalValue::text("Steven Stamkos"),
        );

        let latest = sink.latest(&ViewId::new(PLAYER_COMPARISON)).unwrap();
        match latest {
            ViewData::Series { points } => {
                let series: HashSet<&str> =
                    points.iter().map(|p| p.series.as_str()).collect();
                assert_eq!(
                    series,
                    HashSet::from([
                        "Steven Stamkos · prediction",
                        "Steven Stamkos · point_shares",
                    ])
                );
                // Two seasons, two variables, one selected player twice.
                assert_eq!(points.len(), 4);
            }
            _ => panic!("expected a series"),
        }
    }

    #[test]
    fn test_scenario_unknown_player_reports_and_keeps_previous_view() {
        let dashboard = dashboard();
        let mut session = dashboard.session().unwrap();
        let mut sink = MemorySink::new();
        session.prime(&mut sink);

        let view = ViewId::new(PLAYER_COMPARISON);
        let before = session.scheduler().view_data(&view).unwrap().clone();

        set(
            &mut session,
            &mut sink,
            controls::PLAYER_ONE,
            SignalValue::text("Connor Nobody"),
        );

        assert_eq!(session.scheduler().view_data(&view).unwrap(), &before);
        assert_eq!(sink.errors.len(), 1);
        assert!(sink.errors[0].1.contains("Connor Nobody"));
    }

    #[test]
    fn test_noop_signal_write_triggers_no_updates() {
        let dashboard = dashboard();
        let mut session = dashboard.session().unwrap();
        let mut sink = MemorySink::new();

        // The defaults already hold these values.
        let applied = session
            .apply(
                InteractionEvent {
                    signal: controls::NAME_FILTER.to_string(),
                    value: SignalValue::text(""),
                },
                &mut sink,
            )
            .unwrap();
        assert!(!applied);
        assert!(sink.updates.is_empty());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let dashboard = dashboard();
        let mut first = dashboard.session().unwrap();
        let mut second = dashboard.session().unwrap();
        let mut sink = MemorySink::new();

        set(&mut first, &mut sink, controls::NAME_FILTER, SignalValue::text("kan"));

        assert_eq!(first.store().get(controls::NAME_FILTER), Some(&SignalValue::text("kan")));
        assert_eq!(second.store().get(controls::NAME_FILTER), Some(&SignalValue::text("")));

        // The second session still computes from its own defaults.
        let mut other_sink = MemorySink::new();
        second.prime(&mut other_sink);
        let latest = other_sink.latest(&ViewId::new(PLAYER_SUMMARY_TABLE)).unwrap();
        assert_eq!(table_players(latest).len(), 2);
    }
}
