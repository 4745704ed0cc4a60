//! Team-player mapping persistence
//!
//! The mapping lives in an editable JSON file `{team: [player, ...]}`. A run
//! either regenerates it from possession phases or reads back the
//! user-edited copy, then applies the configured per-team overrides.

use super::output::write_file_atomic;
use crate::features::mapping::{generate_auto_mapping, TeamPlayerMapping};
use crate::features::possession::PossessionPhase;
use crate::{MappingConfig, MatchLogError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Save a mapping as pretty JSON
pub fn save_mapping(mapping: &TeamPlayerMapping, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(mapping)?;
    write_file_atomic(path, json.as_bytes())?;
    log::info!("Saved team mapping ({} teams) to {}", mapping.len(), path.display());
    Ok(())
}

/// Load a mapping saved by [`save_mapping`] or written by hand
pub fn load_mapping(path: &Path) -> Result<TeamPlayerMapping> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MatchLogError::Config(format!("Failed to read mapping file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        MatchLogError::Config(format!("Invalid mapping file {}: {}", path.display(), e))
    })
}

/// Mapping in effect for one run
#[derive(Debug, Clone)]
pub struct ResolvedMapping {
    pub mapping: TeamPlayerMapping,
    pub player_team: HashMap<String, String>,
    /// Freshly generated mapping still to be saved
    pending: Option<(PathBuf, TeamPlayerMapping)>,
}

impl ResolvedMapping {
    /// Save the generated mapping, if this run produced one
    pub fn persist(&self) -> Result<()> {
        match &self.pending {
            Some((path, mapping)) => save_mapping(mapping, path),
            None => Ok(()),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Work out the mapping for a run.
///
/// With `auto_generate`, the automatic mapping is used when the mapping file
/// is missing or `overwrite_auto` is set, and the file is read otherwise.
/// `custom_players` then replaces whole teams. Without `auto_generate`,
/// `custom_players` is the entire mapping.
pub fn resolve_team_mapping(config: &MappingConfig, phases: &[PossessionPhase]) -> Result<ResolvedMapping> {
    let path = PathBuf::from(&config.path);
    let mut pending = None;

    let mut mapping = if config.auto_generate {
        if config.overwrite_auto || !path.exists() {
            let auto = generate_auto_mapping(phases).team_players;
            log::info!("Generated team mapping for {} teams", auto.len());
            pending = Some((path.clone(), auto.clone()));
            auto
        } else {
            log::info!("Using existing team mapping {}", path.display());
            load_mapping(&path)?
        }
    } else {
        if config.custom_players.is_empty() {
            return Err(MatchLogError::Config(
                "auto_generate is off and no custom_players are configured".to_string(),
            ));
        }
        TeamPlayerMapping::new()
    };

    mapping.overlay(&config.custom_players);
    let player_team = mapping.player_team()?;

    Ok(ResolvedMapping {
        mapping,
        player_team,
        pending,
    })
}
