//! Output tables
//!
//! Tables are rendered in memory first and only written once every table of
//! a run has been produced. Each file is written atomically.

use super::sheet::EventSheet;
use crate::features::match_state::MatchTimeline;
use crate::features::passes::PassRecord;
use crate::{LogRow, MatchLogError, Result};
use csv::{StringRecord, Writer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{remove_file, rename, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A rendered file waiting to be written
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// Write `contents` next to `path` under a `tmp` extension and sync it
fn stage(path: &Path, contents: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(contents)?;
    file.flush()?;
    file.sync_all()?;
    Ok(temp_path)
}

/// Write through a temp file then rename over the target
pub fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = stage(path, contents)?;
    rename(&temp_path, path)?;

    log::debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Write every rendered file.
///
/// All temp files are staged before the first rename, so a failed write
/// leaves none of the targets touched.
pub fn write_outputs(files: &[OutputFile]) -> Result<()> {
    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        match stage(&file.path, &file.contents) {
            Ok(temp_path) => staged.push((temp_path, &file.path)),
            Err(e) => {
                for (temp_path, _) in &staged {
                    let _ = remove_file(temp_path);
                }
                return Err(e);
            }
        }
    }

    for (temp_path, path) in staged {
        rename(&temp_path, path)?;
        log::debug!("Wrote {}", path.display());
    }
    Ok(())
}

/// Replace path separators so a team name can be used in a file name
pub fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| MatchLogError::Io(e.into_error()))
}

#[derive(Serialize)]
struct CleanedRecord<'a> {
    start: Option<f64>,
    end: Option<f64>,
    code: &'a str,
    text: Option<&'a str>,
}

/// Full cleaned table: `<dir>/<stem>.csv`
pub fn cleaned_table(rows: &[LogRow], dir: &Path, stem: &str) -> Result<OutputFile> {
    let mut writer = Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(CleanedRecord {
            start: row.start,
            end: row.end,
            code: &row.code,
            text: row.text.as_deref(),
        })?;
    }
    if rows.is_empty() {
        writer.write_record(["start", "end", "code", "text"])?;
    }

    Ok(OutputFile {
        path: dir.join(format!("{}.csv", sanitize_file_name(stem))),
        contents: finish(writer)?,
    })
}

/// Per-team pass tables: `<dir>/<team>_<stem>.csv`; empty teams are skipped
pub fn team_tables(
    teams: &BTreeMap<String, Vec<PassRecord>>,
    dir: &Path,
    stem: &str,
) -> Result<Vec<OutputFile>> {
    let mut files = Vec::new();
    for (team, records) in teams {
        if records.is_empty() {
            log::warn!("No passes for {}, skipping its table", team);
            continue;
        }
        let mut writer = Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record)?;
        }
        files.push(OutputFile {
            path: dir.join(format!(
                "{}_{}.csv",
                sanitize_file_name(team),
                sanitize_file_name(stem)
            )),
            contents: finish(writer)?,
        });
    }
    Ok(files)
}

/// Original rows grouped by state label: `<dir>/<period>_<state>.csv`.
///
/// Each row keeps its original columns followed by `state` (the label, e.g.
/// `first_leading`), `score` and `range` (`start~end` of its segment).
pub fn state_tables(sheet: &EventSheet, timeline: &MatchTimeline, dir: &Path) -> Result<Vec<OutputFile>> {
    let mut groups: BTreeMap<String, Writer<Vec<u8>>> = BTreeMap::new();
    let mut header = sheet.headers.clone();
    header.extend(["state", "score", "range"]);

    for segment in timeline.segments.iter().filter(|s| s.start_idx <= s.end_idx) {
        let label = segment.label();
        if !groups.contains_key(&label) {
            let mut writer = Writer::from_writer(Vec::new());
            writer.write_record(&header)?;
            groups.insert(label.clone(), writer);
        }
        let Some(writer) = groups.get_mut(&label) else {
            continue;
        };

        let score = segment.render_score(&timeline.teams);
        let range = format!("{}~{}", segment.start_idx, segment.end_idx);
        for record in sheet.records.get(segment.start_idx..=segment.end_idx).unwrap_or(&[]) {
            let mut row: StringRecord = record.clone();
            row.push_field(&label);
            row.push_field(&score);
            row.push_field(&range);
            writer.write_record(&row)?;
        }
    }

    groups
        .into_iter()
        .map(|(label, writer)| {
            Ok(OutputFile {
                path: dir.join(format!("{}.csv", label)),
                contents: finish(writer)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::match_state::{segment_match, TeamNames};

    #[test]
    fn test_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("table.csv");

        write_file_atomic(&path, b"a,b\n1,2\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,2\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_failed_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let good = dir.path().join("good.csv");
        let files = vec![
            OutputFile {
                path: good.clone(),
                contents: b"a\n".to_vec(),
            },
            OutputFile {
                path: blocker.join("bad.csv"),
                contents: b"b\n".to_vec(),
            },
        ];

        assert!(write_outputs(&files).is_err());
        assert!(!good.exists());
        assert!(!good.with_extension("tmp").exists());
    }

    #[test]
    fn test_batch_write() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            OutputFile {
                path: dir.path().join("a.csv"),
                contents: b"a\n".to_vec(),
            },
            OutputFile {
                path: dir.path().join("sub").join("b.csv"),
                contents: b"b\n".to_vec(),
            },
        ];

        write_outputs(&files).unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.csv")).unwrap(), "a\n");
        assert_eq!(std::fs::read_to_string(dir.path().join("sub/b.csv")).unwrap(), "b\n");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name(" A/B\\C:D "), "A_B_C_D");
    }

    #[test]
    fn test_cleaned_table() {
        let rows = vec![
            LogRow::new(0, "Home - Possessions", Some("Possessions")).with_span(Some(1.0), Some(2.5)),
            LogRow::new(1, "7 - A", None),
        ];
        let file = cleaned_table(&rows, Path::new("out"), "derby").unwrap();

        assert_eq!(file.path, Path::new("out").join("derby.csv"));
        let text = String::from_utf8(file.contents).unwrap();
        assert_eq!(
            text,
            "start,end,code,text\n1.0,2.5,Home - Possessions,Possessions\n,,7 - A,\n"
        );
    }

    #[test]
    fn test_team_tables_skip_empty() {
        let mut teams = BTreeMap::new();
        teams.insert(
            "Home".to_string(),
            vec![PassRecord {
                start: None,
                end: None,
                player: "7 - A".to_string(),
                team: "Home".to_string(),
            }],
        );
        teams.insert("Away".to_string(), Vec::new());

        let files = team_tables(&teams, Path::new("cut"), "derby").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, Path::new("cut").join("Home_derby.csv"));
        let text = String::from_utf8(files[0].contents.clone()).unwrap();
        assert!(text.starts_with("start,end,player,team\n"));
    }

    #[test]
    fn test_state_tables() {
        let content = "\
id,start,end,code,text
0,0,0,Half,Start of period
1,1,1,Home - 9,Goals
2,2,2,Half,End of period
3,3,3,Half,Start of period
4,4,4,Half,End of period
";
        let sheet = EventSheet::from_reader(Path::new("m.csv"), content.as_bytes()).unwrap();
        let rows = sheet.full_log().unwrap();
        let names = TeamNames::new(["Away", "Home"], &BTreeMap::new());
        let labels = vec!["first".to_string(), "second".to_string()];
        let timeline = segment_match(&rows, &names, &labels).unwrap();

        let files = state_tables(&sheet, &timeline, Path::new("states")).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["first_leading.csv", "first_tied.csv", "second_tied.csv"]);

        let leading = String::from_utf8(files[0].contents.clone()).unwrap();
        assert_eq!(
            leading,
            "id,start,end,code,text,state,score,range\n\
             1,1,1,Home - 9,Goals,first_leading,Away 0 - 1 Home,1~2\n\
             2,2,2,Half,End of period,first_leading,Away 0 - 1 Home,1~2\n"
        );
    }
}
