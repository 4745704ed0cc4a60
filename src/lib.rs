//! Football match event-log analysis
//!
//! Attributes passes to possessing teams, cleans passing sequences and
//! segments the match timeline into score states.

pub mod data;
pub mod features;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Classification text of a possession-marker row
pub const POSSESSIONS: &str = "Possessions";
/// Classification text of a completed pass
pub const SUCCESSFUL_PASSES: &str = "Successful passes";
/// Classification text opening a period
pub const START_OF_PERIOD: &str = "Start of period";
/// Classification text closing a period
pub const END_OF_PERIOD: &str = "End of period";
/// Classification text of a goal
pub const GOALS: &str = "Goals";

/// A single row of a match event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    /// Start timestamp in seconds
    pub start: Option<f64>,
    /// End timestamp in seconds
    pub end: Option<f64>,
    /// Team or player code, e.g. `"7 - J. Smith"` or `"Home - Possessions"`
    pub code: String,
    /// Classification text, absent for pass rows
    pub text: Option<String>,
    /// Position in the source sequence; the only ordering key
    pub original_index: usize,
}

impl LogRow {
    pub fn new(original_index: usize, code: impl Into<String>, text: Option<&str>) -> Self {
        LogRow {
            start: None,
            end: None,
            code: code.into(),
            text: text.map(str::to_string),
            original_index,
        }
    }

    /// Set the start/end timestamps
    pub fn with_span(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Trimmed classification text, if any
    pub fn text_trimmed(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim)
    }
}

impl fmt::Display for LogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "#{} {} [{}]", self.original_index, self.code, text),
            None => write!(f, "#{} {}", self.original_index, self.code),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum MatchLogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input {path}: {message}")]
    InputFormat { path: String, message: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("No known metric among {requested:?}, choose from: {available}")]
    UnknownMetric {
        requested: Vec<String>,
        available: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MatchLogError {
    pub fn input_format(path: impl fmt::Display, message: impl Into<String>) -> Self {
        MatchLogError::InputFormat {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchLogError>;

/// Application configuration loaded from matchlog.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub compare: CompareConfig,
    pub summary: SummaryConfig,
    pub network: NetworkConfig,
    pub state: StateConfig,
    pub mapping: MappingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Event log to process
    pub file: String,
    /// Classification texts kept when filtering the log for possession analysis
    pub useful_text: Vec<String>,
    /// Prepend a copy of the second possession marker so leading passes get an owner
    pub seed_leading_possession: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            file: "input/match.csv".to_string(),
            useful_text: vec![SUCCESSFUL_PASSES.to_string(), POSSESSIONS.to_string()],
            seed_leading_possession: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Derive the team-player mapping from possession phases
    pub auto_generate: bool,
    /// Location of the editable mapping file
    pub path: String,
    /// Replace the mapping file with a freshly generated one
    pub overwrite_auto: bool,
    /// Per-team player lists replacing the resolved ones
    pub custom_players: BTreeMap<String, Vec<String>>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            auto_generate: true,
            path: "mapping/team_players.json".to_string(),
            overwrite_auto: false,
            custom_players: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Cleaned full tables
    pub output_dir: String,
    /// Per-team pass tables
    pub cut_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            output_dir: "output/cleaned".to_string(),
            cut_dir: "output/teams".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub enable: bool,
    /// Log the current input is compared against
    pub base_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub team_name: String,
    pub input_dir: String,
    pub output_dir: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        SummaryConfig {
            team_name: "Home".to_string(),
            input_dir: "output/teams".to_string(),
            output_dir: "output/combined".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub output_dir: String,
    /// Period labels in match order; periods past the end reuse the last label
    pub period_labels: Vec<String>,
    /// Raw team label -> canonical team name
    pub team_corrections: BTreeMap<String, String>,
}

impl Default for StateConfig {
    fn default() -> Self {
        StateConfig {
            output_dir: "output/states".to_string(),
            period_labels: vec!["first".to_string(), "second".to_string()],
            team_corrections: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// A per-team pass table or a directory of them
    pub input_path: String,
    pub output_path: String,
    /// Metric names to compute; all of them when absent
    pub target_metrics: Option<Vec<String>>,
    pub team_name: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            input_path: "output/teams".to_string(),
            output_path: "output/network_metrics.json".to_string(),
            target_metrics: None,
            team_name: "Home".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MatchLogError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| MatchLogError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MatchLogError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_toml_round_trip() {
        let mut config = Config::default();
        config
            .mapping
            .custom_players
            .insert("Home".to_string(), vec!["7 - A. Striker".to_string()]);
        config
            .state
            .team_corrections
            .insert("HOM".to_string(), "Home".to_string());

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str("[input]\nfile = \"games/derby.csv\"\n").unwrap();
        assert_eq!(parsed.input.file, "games/derby.csv");
        assert!(parsed.input.seed_leading_possession);
        assert_eq!(parsed.state.period_labels, vec!["first", "second"]);
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, MatchLogError::Config(_)));
    }
}
