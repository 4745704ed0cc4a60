//! Player roster comparison between two logs of the same match

use super::mapping::AutoMapping;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Players missing from or new in the current log, for one team
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamDiff {
    pub missing: Vec<String>,
    pub added: Vec<String>,
}

/// Differences between a base log and the current log
#[derive(Debug, Clone, Default)]
pub struct PlayerDiff {
    pub base_total: usize,
    pub current_total: usize,
    pub teams: BTreeMap<String, TeamDiff>,
}

impl PlayerDiff {
    pub fn has_differences(&self) -> bool {
        self.teams
            .values()
            .any(|d| !d.missing.is_empty() || !d.added.is_empty())
    }
}

/// Compare player sets. Missing players are grouped by their base team,
/// added players by their current team.
pub fn compare_players(base: &AutoMapping, current: &AutoMapping) -> PlayerDiff {
    let base_players: HashSet<&str> = base.players().collect();
    let current_players: HashSet<&str> = current.players().collect();

    let mut teams: BTreeMap<String, TeamDiff> = BTreeMap::new();
    for player in base_players.difference(&current_players) {
        let team = base.player_team.get(*player).map_or("Unknown", String::as_str);
        teams
            .entry(team.to_string())
            .or_default()
            .missing
            .push(player.to_string());
    }
    for player in current_players.difference(&base_players) {
        let team = current
            .player_team
            .get(*player)
            .map_or("Unknown", String::as_str);
        teams
            .entry(team.to_string())
            .or_default()
            .added
            .push(player.to_string());
    }
    for diff in teams.values_mut() {
        diff.missing.sort();
        diff.added.sort();
    }

    PlayerDiff {
        base_total: base_players.len(),
        current_total: current_players.len(),
        teams,
    }
}

impl fmt::Display for PlayerDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Player comparison")?;
        writeln!(f, "───────────────────────────────")?;
        writeln!(
            f,
            "  Base players: {} | Current players: {}",
            self.base_total, self.current_total
        )?;

        if !self.has_differences() {
            return writeln!(f, "  Rosters are identical");
        }
        for (team, diff) in &self.teams {
            writeln!(f, "\n  {}:", team)?;
            if !diff.missing.is_empty() {
                writeln!(f, "    Missing: {}", diff.missing.join(", "))?;
            }
            if !diff.added.is_empty() {
                writeln!(f, "    Added:   {}", diff.added.join(", "))?;
            }
        }
        Ok(())
    }
}
