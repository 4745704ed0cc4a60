//! Tabular input and output
//!
//! Event-log CSV loading, the team-player mapping file and output tables.

pub mod mapping_file;
pub mod output;
pub mod sheet;
pub mod summary;

pub use mapping_file::{load_mapping, resolve_team_mapping, save_mapping, ResolvedMapping};
pub use output::{write_outputs, OutputFile};
pub use sheet::EventSheet;
