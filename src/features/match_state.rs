//! Score-state segmentation
//!
//! Splits every period of a match into intervals labelled tied, contested,
//! leading or comeback, from the match score and the order of the goals
//! scored in that period.

use super::rows::{self, RowKind};
use crate::{LogRow, MatchLogError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Score situation of an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    /// No goals yet
    Tied,
    /// Level after goals
    Contested,
    Leading,
    /// The leader conceded the period's first goal and scored its last
    Comeback,
}

impl MatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchState::Tied => "tied",
            MatchState::Contested => "contested",
            MatchState::Leading => "leading",
            MatchState::Comeback => "comeback",
        }
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Goal tally per team
pub type Score = BTreeMap<String, u32>;

/// Canonical team names for one match.
///
/// Holds `(raw label, canonical name)` pairs in lookup order; goal rows are
/// attributed to the first pair whose raw label appears in the row's code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamNames {
    pairs: Vec<(String, String)>,
}

impl TeamNames {
    /// Build from raw team labels, applying the correction table
    pub fn new<I, S>(raw_teams: I, corrections: &BTreeMap<String, String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pairs = raw_teams
            .into_iter()
            .map(|raw| {
                let raw = raw.into();
                let canonical = corrections.get(&raw).cloned().unwrap_or_else(|| raw.clone());
                (raw, canonical)
            })
            .collect();
        TeamNames { pairs }
    }

    /// Distinct canonical names in lookup order
    pub fn participants(&self) -> Vec<String> {
        let mut teams: Vec<String> = Vec::new();
        for (_, canonical) in &self.pairs {
            if !teams.contains(canonical) {
                teams.push(canonical.clone());
            }
        }
        teams
    }

    /// Team credited with a goal whose row code is `code`
    pub fn resolve(&self, code: &str) -> String {
        let code = code.trim();
        if let Some((_, canonical)) = self.pairs.iter().find(|(raw, _)| code.contains(raw.as_str())) {
            return canonical.clone();
        }
        match code.split_once(" - ") {
            Some((team, _)) => team.trim().to_string(),
            None => "Unknown".to_string(),
        }
    }
}

/// A period bounded by start/end markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start_idx: usize,
    pub end_idx: usize,
    pub label: String,
}

impl Period {
    pub fn contains(&self, idx: usize) -> bool {
        (self.start_idx..=self.end_idx).contains(&idx)
    }
}

/// A goal with the match score right after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalEvent {
    pub idx: usize,
    pub team: String,
    pub running_score: u32,
    pub total_score: Score,
}

/// A classified interval; segments of one period partition it exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSegment {
    pub start_idx: usize,
    pub end_idx: usize,
    pub state: MatchState,
    pub period: String,
    /// Cumulative match score valid throughout the segment
    pub score: Score,
}

impl StateSegment {
    /// Output label such as `first_leading`
    pub fn label(&self) -> String {
        format!("{}_{}", self.period, self.state)
    }

    /// Score rendered as `Home 1 - 0 Away`
    pub fn render_score(&self, teams: &[String; 2]) -> String {
        let score = |team: &str| self.score.get(team).copied().unwrap_or(0);
        format!(
            "{} {} - {} {}",
            teams[0],
            score(&teams[0]),
            score(&teams[1]),
            teams[1]
        )
    }
}

/// Segmentation result for one match
#[derive(Debug, Clone, Serialize)]
pub struct MatchTimeline {
    pub teams: [String; 2],
    pub periods: Vec<Period>,
    pub goals: Vec<GoalEvent>,
    pub segments: Vec<StateSegment>,
}

/// Label for the `ordinal`-th period; periods past the list reuse its last entry
fn period_label(labels: &[String], ordinal: usize) -> String {
    labels
        .get(ordinal)
        .or_else(|| labels.last())
        .cloned()
        .unwrap_or_else(|| format!("period{}", ordinal + 1))
}

/// Pair boundary markers in index order: 1st/2nd, 3rd/4th, ...
///
/// A pair that is not start-then-end is skipped.
pub fn find_periods(rows: &[LogRow], labels: &[String]) -> Vec<Period> {
    let markers: Vec<(usize, RowKind)> = rows
        .iter()
        .map(|row| (row.original_index, rows::classify(row)))
        .filter(|(_, kind)| matches!(kind, RowKind::PeriodStart | RowKind::PeriodEnd))
        .collect();

    let mut periods = Vec::new();
    for pair in markers.chunks_exact(2) {
        if let [(start_idx, RowKind::PeriodStart), (end_idx, RowKind::PeriodEnd)] = pair {
            periods.push(Period {
                start_idx: *start_idx,
                end_idx: *end_idx,
                label: period_label(labels, periods.len()),
            });
        } else {
            log::warn!("Unmatched period markers at rows {} and {}", pair[0].0, pair[1].0);
        }
    }
    periods
}

/// Goals in index order with the running match score
pub fn find_goals(rows: &[LogRow], teams: &TeamNames) -> Vec<GoalEvent> {
    let mut total: Score = BTreeMap::new();
    let mut goals = Vec::new();

    for row in rows.iter().filter(|r| rows::classify(r) == RowKind::Goal) {
        let team = teams.resolve(&row.code);
        let tally = total.entry(team.clone()).or_insert(0);
        *tally += 1;
        let running_score = *tally;
        goals.push(GoalEvent {
            idx: row.original_index,
            team,
            running_score,
            total_score: total.clone(),
        });
    }

    goals.sort_by_key(|g| g.idx);
    goals
}

/// Classify a score between the two teams given the goals scored so far
pub fn classify_score(score: &Score, teams: &[String; 2], goals: &[&GoalEvent]) -> MatchState {
    let score_a = score.get(&teams[0]).copied().unwrap_or(0);
    let score_b = score.get(&teams[1]).copied().unwrap_or(0);

    if score_a == 0 && score_b == 0 {
        return MatchState::Tied;
    }
    if score_a == score_b {
        return MatchState::Contested;
    }

    let (leader, trailer) = if score_a > score_b {
        (&teams[0], &teams[1])
    } else {
        (&teams[1], &teams[0])
    };

    let mut order = goals.iter().map(|g| &g.team).filter(|t| teams.contains(t));
    let first = order.next();
    let last = order.last().or(first);
    if first == Some(trailer) && last == Some(leader) {
        MatchState::Comeback
    } else {
        MatchState::Leading
    }
}

/// Match-wide tally of the two teams after a goal
fn match_score(total: &Score, teams: &[String; 2]) -> Score {
    teams
        .iter()
        .map(|t| (t.clone(), total.get(t).copied().unwrap_or(0)))
        .collect()
}

/// Cut one period at each of its goals.
///
/// The period opens tied; from its first goal on, segments carry the
/// cumulative match score.
fn segment_period(period: &Period, goals: &[GoalEvent], teams: &[String; 2]) -> Vec<StateSegment> {
    let period_goals: Vec<&GoalEvent> = goals.iter().filter(|g| period.contains(g.idx)).collect();
    let mut tally: Score = teams.iter().map(|t| (t.clone(), 0)).collect();

    let segment = |start_idx, end_idx, state, score: &Score| StateSegment {
        start_idx,
        end_idx,
        state,
        period: period.label.clone(),
        score: score.clone(),
    };

    if period_goals.is_empty() {
        return vec![segment(period.start_idx, period.end_idx, MatchState::Tied, &tally)];
    }

    let mut segments = Vec::new();
    let mut segment_start = period.start_idx;
    for (k, goal) in period_goals.iter().enumerate() {
        if goal.idx > segment_start {
            let state = classify_score(&tally, teams, &period_goals[..=k]);
            segments.push(segment(segment_start, goal.idx - 1, state, &tally));
        }
        tally = match_score(&goal.total_score, teams);
        segment_start = goal.idx;
    }

    let state = classify_score(&tally, teams, &period_goals);
    segments.push(segment(segment_start, period.end_idx, state, &tally));
    segments
}

/// Segment a full match log into score states.
///
/// Needs at least two periods and exactly two participating teams; anything
/// less aborts the whole match without partial output.
pub fn segment_match(
    rows: &[LogRow],
    names: &TeamNames,
    period_labels: &[String],
) -> Result<MatchTimeline> {
    let participants = names.participants();
    let teams: [String; 2] = match participants.len() {
        0 | 1 => {
            return Err(MatchLogError::InsufficientData(format!(
                "need two teams for state analysis, found {}",
                participants.len()
            )))
        }
        2 => [participants[0].clone(), participants[1].clone()],
        n => {
            return Err(MatchLogError::Config(format!(
                "state analysis compares exactly two teams, found {}: {}",
                n,
                participants.join(", ")
            )))
        }
    };

    let periods = find_periods(rows, period_labels);
    if periods.len() < 2 {
        return Err(MatchLogError::InsufficientData(format!(
            "need at least two periods, found {}",
            periods.len()
        )));
    }

    let goals = find_goals(rows, names);
    log::debug!("Found {} periods and {} goals", periods.len(), goals.len());
    let segments = periods
        .iter()
        .flat_map(|period| segment_period(period, &goals, &teams))
        .collect();

    Ok(MatchTimeline {
        teams,
        periods,
        goals,
        segments,
    })
}
