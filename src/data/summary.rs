//! Multi-match pass tables
//!
//! Combines per-team pass tables from several matches and reads pass
//! sequences back for network analysis.

use super::output::{sanitize_file_name, OutputFile};
use crate::{MatchLogError, Result};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A pass table read from disk
#[derive(Debug, Clone)]
struct PassTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
    team: String,
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn read_pass_table(path: &Path) -> Result<PassTable> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let (Some(_), Some(team_column)) = (column(&headers, "player"), column(&headers, "team")) else {
        return Err(MatchLogError::input_format(
            path.display(),
            "missing 'player' or 'team' column",
        ));
    };

    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    let team = records
        .first()
        .and_then(|r| r.get(team_column))
        .map(|t| t.trim().to_string())
        .ok_or_else(|| MatchLogError::input_format(path.display(), "no passes"))?;

    Ok(PassTable {
        headers,
        records,
        team,
    })
}

/// CSV files in `dir`, sorted by name
fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|e| e == "csv").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Concatenate the pass tables in `input_dir` whose name contains
/// `team_name`, grouped by the team of their first row.
///
/// Produces `<output_dir>/<team>_combined.csv` per group. Unreadable files
/// and files without `player`/`team` columns are skipped.
pub fn combine_matches(input_dir: &Path, output_dir: &Path, team_name: &str) -> Result<Vec<OutputFile>> {
    let mut groups: BTreeMap<String, Vec<PassTable>> = BTreeMap::new();

    for path in csv_files(input_dir)? {
        let matches_team = path
            .file_name()
            .map(|n| n.to_string_lossy().contains(team_name))
            .unwrap_or(false);
        if !matches_team {
            continue;
        }
        log::info!("Reading {}", path.display());
        match read_pass_table(&path) {
            Ok(table) => {
                log::info!("  {} passes for {}", table.records.len(), table.team);
                groups.entry(table.team.clone()).or_default().push(table);
            }
            Err(e) => log::warn!("  Skipped: {}", e),
        }
    }

    if groups.is_empty() {
        return Err(MatchLogError::InsufficientData(format!(
            "no pass tables for '{}' in {}",
            team_name,
            input_dir.display()
        )));
    }

    let mut files = Vec::new();
    for (team, tables) in groups {
        let headers = &tables[0].headers;
        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(headers)?;
        for table in &tables {
            if &table.headers != headers {
                log::warn!("Column mismatch in a {} table, skipping it", team);
                continue;
            }
            for record in &table.records {
                writer.write_record(record)?;
            }
        }
        let contents = writer
            .into_inner()
            .map_err(|e| MatchLogError::Io(e.into_error()))?;
        files.push(OutputFile {
            path: output_dir.join(format!("{}_combined.csv", sanitize_file_name(&team))),
            contents,
        });
    }
    Ok(files)
}

fn read_players(path: &Path) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let player_column = column(&headers, "player")
        .ok_or_else(|| MatchLogError::input_format(path.display(), "missing 'player' column"))?;

    let mut players = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(player) = record.get(player_column).map(str::trim).filter(|p| !p.is_empty()) {
            players.push(player.to_string());
        }
    }
    Ok(players)
}

/// Player sequence from one pass table, or from every table in a directory
/// concatenated in file-name order
pub fn read_pass_sequence(path: &Path) -> Result<Vec<String>> {
    if path.is_file() {
        return read_players(path);
    }
    if !path.is_dir() {
        return Err(MatchLogError::input_format(
            path.display(),
            "not a file or directory",
        ));
    }

    let mut sequence = Vec::new();
    for file in csv_files(path)? {
        match read_players(&file) {
            Ok(players) => {
                log::debug!("{} passes from {}", players.len(), file.display());
                sequence.extend(players);
            }
            Err(e) => log::warn!("Skipping {}: {}", file.display(), e),
        }
    }
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_combine_matches() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Home_m2.csv", "start,end,player,team\n3,4,8 - B,Home\n");
        write(dir.path(), "Home_m1.csv", "start,end,player,team\n1,2,7 - A,Home\n");
        write(dir.path(), "Home_bad.csv", "start,end,code\n1,2,7 - A\n");
        write(dir.path(), "Away_m1.csv", "start,end,player,team\n1,2,9 - C,Away\n");

        let out = Path::new("combined");
        let files = combine_matches(dir.path(), out, "Home").unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, out.join("Home_combined.csv"));
        let text = String::from_utf8(files[0].contents.clone()).unwrap();
        assert_eq!(text, "start,end,player,team\n1,2,7 - A,Home\n3,4,8 - B,Home\n");
    }

    #[test]
    fn test_combine_without_matches() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Away_m1.csv", "start,end,player,team\n1,2,9 - C,Away\n");
        assert!(matches!(
            combine_matches(dir.path(), Path::new("out"), "Home"),
            Err(MatchLogError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_read_pass_sequence() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.csv", "start,end,player,team\n,,3 - Z,Home\n");
        write(dir.path(), "a.csv", "start,end,player,team\n,,1 - X,Home\n,,2 - Y,Home\n");
        write(dir.path(), "broken.csv", "start,end\n1,2\n");
        write(dir.path(), "notes.txt", "player\nignored\n");

        let sequence = read_pass_sequence(dir.path()).unwrap();
        assert_eq!(sequence, vec!["1 - X", "2 - Y", "3 - Z"]);

        let single = read_pass_sequence(&dir.path().join("b.csv")).unwrap();
        assert_eq!(single, vec!["3 - Z"]);

        assert!(read_pass_sequence(&dir.path().join("missing")).is_err());
    }
}
