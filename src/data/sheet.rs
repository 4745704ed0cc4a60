//! Event-log CSV loading
//!
//! Columns are positional: 1 = start, 2 = end, 3 = code, 4 = classification
//! text. Header names are kept for output but otherwise ignored.

use crate::features::rows;
use crate::{LogRow, MatchLogError, Result, SUCCESSFUL_PASSES};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::{Path, PathBuf};

const START_COLUMN: usize = 1;
const END_COLUMN: usize = 2;
const CODE_COLUMN: usize = 3;
const TEXT_COLUMN: usize = 4;
const MIN_FIELDS: usize = TEXT_COLUMN + 1;

/// A raw event log as read from disk
#[derive(Debug, Clone)]
pub struct EventSheet {
    pub path: PathBuf,
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
}

impl EventSheet {
    /// Read an event log from a CSV file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| MatchLogError::input_format(path.display(), e.to_string()))?;
        let sheet = Self::from_reader(path, file)?;
        log::info!("Loaded {} rows from {}", sheet.records.len(), path.display());
        Ok(sheet)
    }

    /// Read an event log from any reader; `path` is used for naming and errors
    pub fn from_reader<R: Read>(path: &Path, reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let mut records = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() < MIN_FIELDS {
                return Err(MatchLogError::input_format(
                    path.display(),
                    format!(
                        "row {} has {} columns, expected at least {}",
                        i + 1,
                        record.len(),
                        MIN_FIELDS
                    ),
                ));
            }
            records.push(record);
        }

        Ok(EventSheet {
            path: path.to_path_buf(),
            headers,
            records,
        })
    }

    /// File name without extension, used to name outputs
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string())
    }

    fn parse_time(&self, record: &StringRecord, row: usize, column: usize) -> Result<Option<f64>> {
        let cell = record.get(column).unwrap_or("").trim();
        if cell.is_empty() {
            return Ok(None);
        }
        cell.parse::<f64>().map(Some).map_err(|_| {
            MatchLogError::input_format(
                self.path.display(),
                format!("row {}: '{}' is not a timestamp", row + 1, cell),
            )
        })
    }

    fn to_row(&self, position: usize, record: &StringRecord) -> Result<LogRow> {
        let text = record
            .get(TEXT_COLUMN)
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let code = record.get(CODE_COLUMN).unwrap_or("");
        Ok(LogRow::new(position, code, text).with_span(
            self.parse_time(record, position, START_COLUMN)?,
            self.parse_time(record, position, END_COLUMN)?,
        ))
    }

    /// Every record, indexed by its position in the file
    pub fn full_log(&self) -> Result<Vec<LogRow>> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| self.to_row(i, record))
            .collect()
    }

    /// Records whose classification text is in `useful_text`, re-indexed.
    ///
    /// Pass rows lose their text so they classify as player rows. With
    /// `seed_leading_possession`, a copy of the second possession marker is
    /// put in front so passes logged before the first marker have an owner.
    pub fn filtered_log(&self, useful_text: &[String], seed_leading_possession: bool) -> Result<Vec<LogRow>> {
        let mut rows = Vec::new();
        for (i, record) in self.records.iter().enumerate() {
            let mut row = self.to_row(i, record)?;
            let useful = row
                .text_trimmed()
                .is_some_and(|text| useful_text.iter().any(|u| u == text));
            if !useful {
                continue;
            }
            if row.text_trimmed() == Some(SUCCESSFUL_PASSES) {
                row.text = None;
            }
            rows.push(row);
        }

        if seed_leading_possession {
            let seed = rows
                .iter()
                .filter(|r| rows::is_possession_marker(r))
                .nth(1)
                .map(|r| r.clone().with_span(None, None));
            match seed {
                Some(seed) => rows.insert(0, seed),
                None => log::debug!("Fewer than two possession markers, nothing to seed"),
            }
        }

        for (i, row) in rows.iter_mut().enumerate() {
            row.original_index = i;
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
id,start,end,code,text
0,0,0,Half,Start of period
1,1.5,2.0,Home - Possessions,Possessions
2,2.0,3.0,7 - A. Striker,Successful passes
3,3.0,3.5,7 - A. Striker,Shot
4,4.0,5.0,Away - Possessions,Possessions
5,5.0,,9 - B. Keeper,Successful passes
";

    fn sheet(content: &str) -> Result<EventSheet> {
        EventSheet::from_reader(Path::new("games/derby.csv"), content.as_bytes())
    }

    fn useful() -> Vec<String> {
        vec![SUCCESSFUL_PASSES.to_string(), crate::POSSESSIONS.to_string()]
    }

    #[test]
    fn test_full_log() {
        let sheet = sheet(LOG).unwrap();
        let rows = sheet.full_log().unwrap();

        assert_eq!(sheet.stem(), "derby");
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].text.as_deref(), Some("Start of period"));
        assert_eq!(rows[2].start, Some(2.0));
        assert_eq!(rows[5].end, None);
        assert_eq!(rows[5].original_index, 5);
    }

    #[test]
    fn test_filtered_log_without_seed() {
        let rows = sheet(LOG).unwrap().filtered_log(&useful(), false).unwrap();

        let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(
            codes,
            vec!["Home - Possessions", "7 - A. Striker", "Away - Possessions", "9 - B. Keeper"]
        );
        assert!(rows[1].text.is_none());
        assert!(rows::is_player_row(&rows[1]));
        assert_eq!(rows[3].original_index, 3);
    }

    #[test]
    fn test_filtered_log_seeds_second_marker() {
        let rows = sheet(LOG).unwrap().filtered_log(&useful(), true).unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].code, "Away - Possessions");
        assert_eq!(rows[0].start, None);
        assert_eq!(rows[0].original_index, 0);
        assert_eq!(rows[1].code, "Home - Possessions");
        assert_eq!(rows[4].original_index, 4);
    }

    #[test]
    fn test_short_rows_rejected() {
        let err = sheet("id,start,end\n0,1,2\n").unwrap_err();
        assert!(matches!(err, MatchLogError::InputFormat { .. }));
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let sheet = sheet("id,start,end,code,text\n0,soon,2,X,Goals\n").unwrap();
        assert!(matches!(
            sheet.full_log(),
            Err(MatchLogError::InputFormat { .. })
        ));
    }
}
