//! The declared input controls.

/// Signal names. Each UI control is bound to exactly one of these.
pub const NAME_FILTER: &str = "name_filter";
pub const DRAFT_RANGE: &str = "draft_range";
pub const PLAYER_ONE: &str = "player_one";
pub const PLAYER_TWO: &str = "player_two";
