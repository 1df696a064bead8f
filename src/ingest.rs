//! Dataset ingestion.
//!
//! Both source files are read once at startup into immutable frames. Header
//! names follow the published files; internal field names are the snake_case
//! forms in [`fields`]. Any unreadable or malformed input is a configuration
//! error naming the offending file, since the process has nothing to serve
//! without its dataset.

use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::CoreError;
use crate::frame::{Frame, FrameBuilder};

/// Internal field names, shared by pipelines, views, and bindings.
pub mod fields {
    pub const PLAYER: &str = "player";
    pub const DRAFT_YEAR: &str = "draft_year";
    pub const PICK: &str = "pick";
    pub const ROUND: &str = "round";
    pub const DRAFT_TEAM: &str = "draft_team";
    pub const SEASON: &str = "season";
    pub const SEASON_START: &str = "season_start";
    pub const YEARS_AFTER_DRAFT: &str = "years_after_draft";
    pub const PREDICTION: &str = "prediction";
    pub const POINT_SHARES: &str = "point_shares";

    pub const NHL_PROBABILITY: &str = "nhl_probability";
    pub const STAR_PROBABILITY: &str = "star_probability";

    /// Derived in the player summary: actual minus predicted point shares.
    pub const RESIDUAL: &str = "residual";
}

/// One row of `player_seasons.csv`.
#[derive(Debug, Deserialize)]
struct SeasonRecord {
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "Draft_Year")]
    draft_year: i64,
    #[serde(rename = "Pick")]
    pick: i64,
    #[serde(rename = "Round")]
    round: String,
    #[serde(rename = "Draft_Team")]
    draft_team: String,
    #[serde(rename = "Season")]
    season: String,
    #[serde(rename = "Season_Start")]
    season_start: i64,
    #[serde(rename = "Years_After_Draft")]
    years_after_draft: i64,
    #[serde(rename = "Prediction")]
    prediction: f64,
    #[serde(rename = "PS")]
    point_shares: f64,
}

/// One row of `pick_probabilities.csv`.
#[derive(Debug, Deserialize)]
struct ProbabilityRecord {
    #[serde(rename = "Pick")]
    pick: i64,
    #[serde(rename = "Years After Draft")]
    years_after_draft: i64,
    #[serde(rename = "NHL Probability")]
    nhl_probability: f64,
    #[serde(rename = "Star Probability")]
    star_probability: f64,
}

pub fn load_player_seasons(path: &Path) -> Result<Frame, CoreError> {
    let file = open(path)?;
    read_player_seasons(file).map_err(|e| at_path(e, path))
}

pub fn load_pick_probabilities(path: &Path) -> Result<Frame, CoreError> {
    let file = open(path)?;
    read_pick_probabilities(file).map_err(|e| at_path(e, path))
}

/// Reader-based variant, used directly by tests.
pub fn read_player_seasons<R: Read>(reader: R) -> Result<Frame, CoreError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in csv_reader.deserialize::<SeasonRecord>() {
        records.push(result.map_err(csv_error)?);
    }
    tracing::info!(rows = records.len(), "loaded player seasons");

    FrameBuilder::new()
        .with_strings(fields::PLAYER, records.iter().map(|r| r.player.clone()).collect())
        .with_int(fields::DRAFT_YEAR, records.iter().map(|r| r.draft_year).collect())
        .with_int(fields::PICK, records.iter().map(|r| r.pick).collect())
        .with_strings(fields::ROUND, records.iter().map(|r| r.round.clone()).collect())
        .with_strings(
            fields::DRAFT_TEAM,
            records.iter().map(|r| r.draft_team.clone()).collect(),
        )
        .with_strings(fields::SEASON, records.iter().map(|r| r.season.clone()).collect())
        .with_int(fields::SEASON_START, records.iter().map(|r| r.season_start).collect())
        .with_int(
            fields::YEARS_AFTER_DRAFT,
            records.iter().map(|r| r.years_after_draft).collect(),
        )
        .with_float(fields::PREDICTION, records.iter().map(|r| r.prediction).collect())
        .with_float(fields::POINT_SHARES, records.iter().map(|r| r.point_shares).collect())
        .finish()
}

pub fn read_pick_probabilities<R: Read>(reader: R) -> Result<Frame, CoreError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in csv_reader.deserialize::<ProbabilityRecord>() {
        records.push(result.map_err(csv_error)?);
    }
    tracing::info!(rows = records.len(), "loaded pick probabilities");

    FrameBuilder::new()
        .with_int(fields::PICK, records.iter().map(|r| r.pick).collect())
        .with_int(
            fields::YEARS_AFTER_DRAFT,
            records.iter().map(|r| r.years_after_draft).collect(),
        )
        .with_float(
            fields::NHL_PROBABILITY,
            records.iter().map(|r| r.nhl_probability).collect(),
        )
        .with_float(
            fields::STAR_PROBABILITY,
            records.iter().map(|r| r.star_probability).collect(),
        )
        .finish()
}

fn open(path: &Path) -> Result<File, CoreError> {
    File::open(path).map_err(|err| {
        CoreError::config(format!("cannot open '{}': {}", path.display(), err))
    })
}

fn csv_error(err: csv::Error) -> CoreError {
    CoreError::config(format!("malformed dataset row: {}", err))
}

fn at_path(err: CoreError, path: &Path) -> CoreError {
    match err {
        CoreError::Configuration(msg) => {
            CoreError::config(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEASONS: &str = "\
Player,Draft_Year,Pick,Round,Draft_Team,Season,Season_Start,Years_After_Draft,Prediction,PS
Patrick Kane,2007,1,1,CHI,2007-08,2007,0,2.1,3.5
Patrick Kane,2007,1,1,CHI,2008-09,2008,1,2.9,4.0
Steven Stamkos,2008,1,1,TBL,2008-09,2008,0,2.4,1.5
";

    #[test]
    fn test_reads_seasons_with_faithful_types() {
        let frame = read_player_seasons(SEASONS.as_bytes()).unwrap();
        assert_eq!(frame.row_count(), 3);
        assert_eq!(
            frame.column_by_name(fields::PLAYER).unwrap().str_at(0),
            Some("Patrick Kane")
        );
        assert_eq!(
            frame.column_by_name(fields::DRAFT_YEAR).unwrap().int_at(2),
            Some(2008)
        );
        assert_eq!(
            frame.column_by_name(fields::PREDICTION).unwrap().f64_at(1),
            Some(2.9)
        );
        // Round stays categorical.
        assert_eq!(frame.column_by_name(fields::ROUND).unwrap().str_at(0), Some("1"));
    }

    #[test]
    fn test_malformed_row_is_configuration_error() {
        let bad = "\
Player,Draft_Year,Pick,Round,Draft_Team,Season,Season_Start,Years_After_Draft,Prediction,PS
Patrick Kane,not_a_year,1,1,CHI,2007-08,2007,0,2.1,3.5
";
        let err = read_player_seasons(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn test_load_from_path_names_file_in_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Pick,Wrong Header\n1,2\n").unwrap();
        let err = load_pick_probabilities(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_loads_probabilities_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "Pick,Years After Draft,NHL Probability,Star Probability\n1,0,0.9,0.4\n1,1,0.95,0.5\n"
        )
        .unwrap();
        let frame = load_pick_probabilities(file.path()).unwrap();
        assert_eq!(frame.row_count(), 2);
        assert_eq!(
            frame.column_by_name(fields::NHL_PROBABILITY).unwrap().f64_at(1),
            Some(0.95)
        );
    }
}
