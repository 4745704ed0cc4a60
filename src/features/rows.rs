//! Row classification
//!
//! Decides what a single log row encodes from its code and text columns.

use crate::{LogRow, END_OF_PERIOD, GOALS, POSSESSIONS, START_OF_PERIOD};

/// Marker fragment inside the code of a possession-marker row
const POSSESSION_SUFFIX: &str = "- Possessions";

/// What a log row encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// `"<team> - Possessions"`: the named team gains the ball
    PossessionMarker,
    /// A pass received by `"<jersey> - <name>"`
    Player,
    PeriodStart,
    PeriodEnd,
    Goal,
    Other,
}

/// Classify a row; possession markers take precedence over every other kind
pub fn classify(row: &LogRow) -> RowKind {
    if is_possession_marker(row) {
        return RowKind::PossessionMarker;
    }
    if is_player_row(row) {
        return RowKind::Player;
    }
    match row.text_trimmed() {
        Some(START_OF_PERIOD) => RowKind::PeriodStart,
        Some(END_OF_PERIOD) => RowKind::PeriodEnd,
        Some(GOALS) => RowKind::Goal,
        _ => RowKind::Other,
    }
}

pub fn is_possession_marker(row: &LogRow) -> bool {
    row.code.contains(POSSESSION_SUFFIX)
}

/// A player row has no text and a code whose part before the first hyphen
/// carries a jersey number.
pub fn is_player_row(row: &LogRow) -> bool {
    row.text.is_none() && is_player_code(&row.code)
}

/// True for codes shaped like `"<jersey> - <name>"`
pub fn is_player_code(code: &str) -> bool {
    if code.contains(POSSESSIONS) {
        return false;
    }
    match code.split_once('-') {
        Some((head, _)) => head.trim().chars().any(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Team named by a possession marker code: the text before the first `" - "`
pub fn marker_team(code: &str) -> &str {
    code.split(" - ").next().unwrap_or(code).trim()
}
