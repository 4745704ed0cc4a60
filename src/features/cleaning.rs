//! Row validation and cleanup
//!
//! Keeps only player rows consistent with the possessing team, drops phases
//! with fewer than two valid receptions and merges repeated receptions.

use super::possession::PossessionPhase;
use super::rows::{self, RowKind};
use crate::LogRow;
use std::collections::HashMap;

/// Minimum valid player rows for a phase to survive
pub const MIN_PHASE_PLAYERS: usize = 2;

/// Row counts at each cleaning stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub kept_rows: usize,
    pub merged_rows: usize,
    pub kept_phases: usize,
    pub dropped_phases: usize,
}

/// Output of [`clean_log`]
#[derive(Debug, Clone)]
pub struct CleanedLog {
    pub rows: Vec<LogRow>,
    pub report: CleaningReport,
}

/// Positions of `rows` whose index falls inside the phase
fn phase_positions(rows: &[LogRow], phase: &PossessionPhase) -> std::ops::Range<usize> {
    let first = rows.partition_point(|r| r.original_index < phase.start_idx);
    let last = rows.partition_point(|r| r.original_index <= phase.end_idx);
    first..last.max(first)
}

/// Select rows consistent with the team-player mapping.
///
/// A player row survives when its player belongs to the phase's team. A
/// phase keeps its marker row only with at least two surviving player rows;
/// otherwise its player rows are discarded too. Rows outside every phase
/// never survive. `rows` must be sorted by `original_index`.
pub fn select_valid_rows(
    rows: &[LogRow],
    phases: &[PossessionPhase],
    player_team: &HashMap<String, String>,
) -> (Vec<LogRow>, usize) {
    let mut keep = vec![false; rows.len()];
    let mut kept_phases = 0;

    for phase in phases {
        let mut valid_positions = Vec::new();
        let mut marker_position = None;

        for pos in phase_positions(rows, phase) {
            let row = &rows[pos];
            if row.original_index == phase.start_idx {
                marker_position = Some(pos);
            }
            if rows::classify(row) != RowKind::Player {
                continue;
            }
            if player_team.get(row.code.trim()) == Some(&phase.team) {
                valid_positions.push(pos);
            }
        }

        if valid_positions.len() >= MIN_PHASE_PLAYERS {
            kept_phases += 1;
            for pos in valid_positions {
                keep[pos] = true;
            }
            if let Some(pos) = marker_position {
                keep[pos] = true;
            }
        } else {
            log::debug!(
                "Dropping {} phase at rows {}..={} ({} valid players)",
                phase.team,
                phase.start_idx,
                phase.end_idx,
                valid_positions.len()
            );
        }
    }

    let kept = rows
        .iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then(|| row.clone()))
        .collect();
    (kept, kept_phases)
}

/// Collapse adjacent player rows naming the same player into one row
/// spanning the first row's start to the last row's end.
///
/// Only directly adjacent rows merge; a different player in between keeps
/// them apart.
pub fn merge_consecutive_players(rows: Vec<LogRow>) -> Vec<LogRow> {
    if rows.len() < 2 {
        return rows;
    }

    let mut rows = rows;
    let mut keep = vec![true; rows.len()];
    for i in (1..rows.len()).rev() {
        let (current, previous) = (&rows[i], &rows[i - 1]);
        if rows::is_player_row(current)
            && rows::is_player_row(previous)
            && current.code.trim() == previous.code.trim()
        {
            rows[i - 1].end = rows[i].end;
            keep[i] = false;
        }
    }

    rows.into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}

/// Validate rows against the mapping, then merge repeated receptions
pub fn clean_log(
    rows: &[LogRow],
    phases: &[PossessionPhase],
    player_team: &HashMap<String, String>,
) -> CleanedLog {
    let (kept, kept_phases) = select_valid_rows(rows, phases, player_team);
    let kept_rows = kept.len();
    let merged = merge_consecutive_players(kept);

    let report = CleaningReport {
        input_rows: rows.len(),
        kept_rows,
        merged_rows: merged.len(),
        kept_phases,
        dropped_phases: phases.len() - kept_phases,
    };
    log::info!(
        "Cleaning: {} rows -> {} valid -> {} after merging ({} of {} phases kept)",
        report.input_rows,
        report.kept_rows,
        report.merged_rows,
        report.kept_phases,
        phases.len()
    );

    CleanedLog {
        rows: merged,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::mapping::TeamPlayerMapping;
    use crate::features::possession::extract_possession_phases;
    use std::collections::HashSet;

    fn scenario_rows() -> Vec<LogRow> {
        vec![
            LogRow::new(0, "A - Possessions", Some("Possessions")),
            LogRow::new(1, "1 - X", None).with_span(Some(1.0), Some(2.0)),
            LogRow::new(2, "2 - Y", None).with_span(Some(3.0), Some(4.0)),
            LogRow::new(3, "1 - X", None).with_span(Some(5.0), Some(6.0)),
            LogRow::new(4, "3 - Z", None).with_span(Some(7.0), Some(8.0)),
            LogRow::new(5, "B - Possessions", Some("Possessions")),
            LogRow::new(6, "3 - Z", None),
            LogRow::new(7, "1 - X", None),
            LogRow::new(8, "2 - Y", None),
            LogRow::new(9, "4 - W", None),
        ]
    }

    fn scenario_mapping() -> HashMap<String, String> {
        let mut mapping = TeamPlayerMapping::new();
        mapping.set_team("A", vec!["1 - X".to_string(), "2 - Y".to_string()]);
        mapping.set_team("B", vec!["3 - Z".to_string()]);
        mapping.player_team().unwrap()
    }

    #[test]
    fn test_small_phase_is_discarded() {
        let rows = scenario_rows();
        let phases = extract_possession_phases(&rows);
        let (kept, kept_phases) = select_valid_rows(&rows, &phases, &scenario_mapping());

        let indices: Vec<usize> = kept.iter().map(|r| r.original_index).collect();
        // Phase A: marker + X, Y, X; Z is not an A player.
        // Phase B: only Z is valid (1 < 2), so nothing survives.
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(kept_phases, 1);
    }

    #[test]
    fn test_kept_players_belong_to_phase_team() {
        let rows = scenario_rows();
        let phases = extract_possession_phases(&rows);
        let mapping = scenario_mapping();
        let (kept, _) = select_valid_rows(&rows, &phases, &mapping);

        for row in kept.iter().filter(|r| rows::is_player_row(r)) {
            let owner = phases.iter().find(|p| p.contains(row.original_index)).unwrap();
            assert_eq!(mapping[row.code.trim()], owner.team);
        }
    }

    #[test]
    fn test_rows_outside_phases_never_kept() {
        let mut rows = vec![LogRow::new(0, "1 - X", None), LogRow::new(1, "2 - Y", None)];
        rows.extend(scenario_rows().into_iter().map(|mut r| {
            r.original_index += 2;
            r
        }));
        let phases = extract_possession_phases(&rows);
        let (kept, _) = select_valid_rows(&rows, &phases, &scenario_mapping());
        assert!(kept.iter().all(|r| r.original_index >= 2));
    }

    #[test]
    fn test_merge_adjacent_duplicates() {
        let rows = vec![
            LogRow::new(0, "A - Possessions", Some("Possessions")),
            LogRow::new(1, "1 - X", None).with_span(Some(1.0), Some(2.0)),
            LogRow::new(2, "1 - X ", None).with_span(Some(3.0), Some(4.0)),
            LogRow::new(3, "1 - X", None).with_span(Some(5.0), Some(6.0)),
            LogRow::new(4, "2 - Y", None).with_span(Some(7.0), Some(8.0)),
            LogRow::new(5, "1 - X", None).with_span(Some(9.0), Some(10.0)),
        ];
        let merged = merge_consecutive_players(rows);

        assert_eq!(merged.len(), 4);
        assert_eq!(merged[1].original_index, 1);
        assert_eq!(merged[1].start, Some(1.0));
        assert_eq!(merged[1].end, Some(6.0));
        // Separated by Y, so not merged
        assert_eq!(merged[3].original_index, 5);
        assert_eq!(merged[3].start, Some(9.0));
    }

    #[test]
    fn test_merge_ignores_marker_rows() {
        let rows = vec![
            LogRow::new(0, "A - Possessions", Some("Possessions")),
            LogRow::new(1, "A - Possessions", Some("Possessions")),
        ];
        assert_eq!(merge_consecutive_players(rows).len(), 2);
    }

    #[test]
    fn test_merge_keeps_distinct_players() {
        let rows = scenario_rows();
        let before: HashSet<String> = rows
            .iter()
            .filter(|r| rows::is_player_row(r))
            .map(|r| r.code.trim().to_string())
            .collect();
        let merged = merge_consecutive_players(rows);
        let after: HashSet<String> = merged
            .iter()
            .filter(|r| rows::is_player_row(r))
            .map(|r| r.code.trim().to_string())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_clean_log_report() {
        let rows = scenario_rows();
        let phases = extract_possession_phases(&rows);
        let cleaned = clean_log(&rows, &phases, &scenario_mapping());

        assert_eq!(cleaned.report.input_rows, 10);
        assert_eq!(cleaned.report.kept_rows, 4);
        assert_eq!(cleaned.report.merged_rows, 4);
        assert_eq!(cleaned.report.dropped_phases, 1);
    }
}
