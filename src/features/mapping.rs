//! Team-player mapping
//!
//! Infers which team each player belongs to from possession phases and
//! holds the resolved team -> players table.

use super::possession::PossessionPhase;
use crate::{MatchLogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Team name -> player codes, persisted as a JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamPlayerMapping(BTreeMap<String, Vec<String>>);

impl TeamPlayerMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn players(&self, team: &str) -> Option<&[String]> {
        self.0.get(team).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Replace a team's player list
    pub fn set_team(&mut self, team: &str, players: Vec<String>) {
        self.0.insert(team.to_string(), players);
    }

    /// Replace the listed teams wholesale, leaving the others untouched
    pub fn overlay(&mut self, overrides: &BTreeMap<String, Vec<String>>) {
        for (team, players) in overrides {
            self.set_team(team, players.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Invert to player -> team.
    ///
    /// Fails when the mapping is empty or a player is listed under two teams.
    pub fn player_team(&self) -> Result<HashMap<String, String>> {
        if self.is_empty() {
            return Err(MatchLogError::Config(
                "team-player mapping must contain at least one team".to_string(),
            ));
        }

        let mut player_team = HashMap::new();
        for (team, players) in &self.0 {
            for player in players {
                let player = player.trim().to_string();
                match player_team.get(&player) {
                    Some(existing) if existing != team => {
                        return Err(MatchLogError::Config(format!(
                            "player {} is listed under both {} and {}",
                            player, existing, team
                        )));
                    }
                    _ => {
                        player_team.insert(player, team.clone());
                    }
                }
            }
        }
        Ok(player_team)
    }
}

impl From<BTreeMap<String, Vec<String>>> for TeamPlayerMapping {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        TeamPlayerMapping(map)
    }
}

/// Mapping inferred from appearance counts
#[derive(Debug, Clone, Default)]
pub struct AutoMapping {
    pub team_players: TeamPlayerMapping,
    pub player_team: HashMap<String, String>,
}

impl AutoMapping {
    /// All players seen in any phase
    pub fn players(&self) -> impl Iterator<Item = &str> {
        self.player_team.keys().map(String::as_str)
    }
}

/// Appearance counts per player, in first-seen order
#[derive(Debug, Default)]
struct AppearanceCounts {
    players: Vec<String>,
    counts: HashMap<String, Vec<(String, usize)>>,
}

impl AppearanceCounts {
    fn record(&mut self, player: &str, team: &str) {
        if !self.counts.contains_key(player) {
            self.players.push(player.to_string());
        }
        let teams = self.counts.entry(player.to_string()).or_default();
        match teams.iter_mut().find(|(t, _)| t == team) {
            Some((_, count)) => *count += 1,
            None => teams.push((team.to_string(), 1)),
        }
    }

    /// Team with the highest count; ties go to the team seen first
    fn dominant_team(&self, player: &str) -> Option<&str> {
        let teams = self.counts.get(player)?;
        let mut best: Option<&(String, usize)> = None;
        for entry in teams {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(team, _)| team.as_str())
    }
}

/// Assign every player to the team they appear with most often
pub fn generate_auto_mapping(phases: &[PossessionPhase]) -> AutoMapping {
    let mut counts = AppearanceCounts::default();
    for phase in phases {
        for player in &phase.players {
            counts.record(player, &phase.team);
        }
    }

    let mut team_players: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut player_team = HashMap::new();
    for player in &counts.players {
        if let Some(team) = counts.dominant_team(player) {
            team_players
                .entry(team.to_string())
                .or_default()
                .push(player.clone());
            player_team.insert(player.clone(), team.to_string());
        }
    }

    log::debug!(
        "Auto mapping: {} players across {} teams",
        player_team.len(),
        team_players.len()
    );

    AutoMapping {
        team_players: team_players.into(),
        player_team,
    }
}
