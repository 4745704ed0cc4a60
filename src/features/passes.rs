//! Per-team pass tables
//!
//! Attributes each player row of a cleaned log to the team named by the
//! closest preceding possession marker.

use super::rows;
use crate::{LogRow, MatchLogError, Result, POSSESSIONS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static POSSESSION_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*-\s*Possessions").expect("possession pattern is valid")
});

/// One reception in a team's pass sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRecord {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub player: String,
    pub team: String,
}

/// Team named by a possession-marker row, if the row is one
fn possession_team(row: &LogRow) -> Option<String> {
    if row.text_trimmed() != Some(POSSESSIONS) {
        return None;
    }
    POSSESSION_CODE
        .captures(&row.code)
        .map(|caps| caps[1].trim().to_string())
}

/// Group the player rows of a cleaned log into per-team pass sequences.
///
/// Every team that owns a possession marker gets an entry, possibly empty.
pub fn split_by_team(rows: &[LogRow]) -> Result<BTreeMap<String, Vec<PassRecord>>> {
    let mut teams: BTreeMap<String, Vec<PassRecord>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for row in rows {
        if let Some(team) = possession_team(row) {
            teams.entry(team.clone()).or_default();
            current = Some(team);
            continue;
        }
        let Some(team) = current.as_ref() else {
            continue;
        };
        if rows::is_player_row(row) {
            if let Some(records) = teams.get_mut(team) {
                records.push(PassRecord {
                    start: row.start,
                    end: row.end,
                    player: row.code.trim().to_string(),
                    team: team.clone(),
                });
            }
        }
    }

    if teams.is_empty() {
        return Err(MatchLogError::InsufficientData(
            "no possession markers found in the cleaned log".to_string(),
        ));
    }
    Ok(teams)
}

/// Player codes in pass order
pub fn pass_sequence(records: &[PassRecord]) -> Vec<String> {
    records.iter().map(|r| r.player.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_by_team() {
        let rows = vec![
            LogRow::new(0, "Home - Possessions", Some("Possessions")),
            LogRow::new(1, " 1 - X ", None).with_span(Some(1.0), Some(1.5)),
            LogRow::new(2, "2 - Y", None),
            LogRow::new(3, "Away - Possessions", Some("Possessions")),
            LogRow::new(4, "3 - Z", None),
            LogRow::new(5, "Neutral - Possessions", Some("Possessions")),
        ];
        let teams = split_by_team(&rows).unwrap();

        assert_eq!(teams.len(), 3);
        assert_eq!(pass_sequence(&teams["Home"]), vec!["1 - X", "2 - Y"]);
        assert_eq!(teams["Home"][0].start, Some(1.0));
        assert_eq!(teams["Away"][0].team, "Away");
        assert!(teams["Neutral"].is_empty());
    }

    #[test]
    fn test_rows_before_marker_are_unowned() {
        let rows = vec![
            LogRow::new(0, "1 - X", None),
            LogRow::new(1, "Home - Possessions", Some("Possessions")),
        ];
        let teams = split_by_team(&rows).unwrap();
        assert!(teams["Home"].is_empty());
    }

    #[test]
    fn test_no_markers_is_an_error() {
        let rows = vec![LogRow::new(0, "1 - X", None)];
        assert!(matches!(
            split_by_team(&rows),
            Err(MatchLogError::InsufficientData(_))
        ));
    }
}
