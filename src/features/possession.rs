//! Possession phase extraction
//!
//! Splits an ordered log into contiguous phases, each owned by the team
//! named in the possession marker that opens it.

use super::rows::{self, RowKind};
use crate::LogRow;
use serde::{Deserialize, Serialize};

/// A contiguous run of rows during which one team had the ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossessionPhase {
    pub team: String,
    /// Trimmed player codes in appearance order, duplicates kept
    pub players: Vec<String>,
    /// Index of the possession marker row
    pub start_idx: usize,
    /// Index of the last row before the next marker
    pub end_idx: usize,
}

impl PossessionPhase {
    fn open(team: &str, start_idx: usize) -> Self {
        PossessionPhase {
            team: team.to_string(),
            players: Vec::new(),
            start_idx,
            end_idx: start_idx,
        }
    }

    pub fn contains(&self, idx: usize) -> bool {
        (self.start_idx..=self.end_idx).contains(&idx)
    }
}

/// Scan rows in index order and cut them into possession phases.
///
/// Rows ahead of the first possession marker belong to no phase and are
/// dropped.
pub fn extract_possession_phases(rows: &[LogRow]) -> Vec<PossessionPhase> {
    let mut phases = Vec::new();
    let mut current: Option<PossessionPhase> = None;
    let mut previous_idx = 0;

    for row in rows {
        match rows::classify(row) {
            RowKind::PossessionMarker => {
                if let Some(mut phase) = current.take() {
                    phase.end_idx = previous_idx;
                    phases.push(phase);
                }
                current = Some(PossessionPhase::open(
                    rows::marker_team(&row.code),
                    row.original_index,
                ));
            }
            RowKind::Player => {
                if let Some(phase) = current.as_mut() {
                    phase.players.push(row.code.trim().to_string());
                }
            }
            _ => {}
        }
        previous_idx = row.original_index;
    }

    if let Some(mut phase) = current {
        phase.end_idx = previous_idx;
        phases.push(phase);
    }

    log::debug!("Extracted {} possession phases from {} rows", phases.len(), rows.len());
    phases
}
