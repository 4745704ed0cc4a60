//! Event-log analysis
//!
//! Row classification, possession phases, team-player mapping, cleaning,
//! match-state segmentation and pass-network metrics.

pub mod cleaning;
pub mod comparison;
pub mod mapping;
pub mod match_state;
pub mod network;
pub mod passes;
pub mod possession;
pub mod rows;

pub use cleaning::{clean_log, CleanedLog, CleaningReport};
pub use comparison::{compare_players, PlayerDiff};
pub use mapping::{generate_auto_mapping, AutoMapping, TeamPlayerMapping};
pub use match_state::{segment_match, MatchState, MatchTimeline, StateSegment, TeamNames};
pub use network::{calculate_network_metrics, Metric, NetworkReport, PassGraph};
pub use passes::{split_by_team, PassRecord};
pub use possession::{extract_possession_phases, PossessionPhase};
pub use rows::{classify, RowKind};
