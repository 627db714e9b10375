//! Record sources feeding the ingestion pipeline.
//!
//! A source is opened once per rebuild and yields rows lazily. Failing to open is a
//! [`SearchError::Source`]; failures on individual rows are reported per row.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Result, RowError, SearchError};
use crate::RawRecord;

pub type RowIter<'a> = Box<dyn Iterator<Item = std::result::Result<RawRecord, RowError>> + 'a>;

pub trait RecordSource {
    fn rows(&self) -> Result<RowIter<'_>>;
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    rows: Vec<RawRecord>,
}

impl VecSource {
    pub fn new(rows: Vec<RawRecord>) -> Self { Self { rows } }
}

impl RecordSource for VecSource {
    fn rows(&self) -> Result<RowIter<'_>> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
    Jsonl,
}

/// A `.csv`, `.json` or `.jsonl` file of records.
///
/// CSV needs a header row; header names are matched case-insensitively. JSON may be an
/// array of objects or a single object. JSONL holds one object per line, blank lines ignored.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: Format,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = match path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("csv") => Format::Csv,
            Some("json") => Format::Json,
            Some("jsonl") => Format::Jsonl,
            _ => return Err(SearchError::Source(format!("unsupported record file {}", path.display()))),
        };
        Ok(Self { path, format })
    }

    fn open_file(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| SearchError::Source(format!("{}: {e}", self.path.display())))
    }

    fn csv_rows(&self) -> Result<RowIter<'_>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(self.open_file()?);
        let headers: csv::StringRecord = reader
            .headers()
            .map_err(|e| SearchError::Source(e.to_string()))?
            .iter()
            .map(str::to_lowercase)
            .collect();
        Ok(Box::new(reader.into_records().map(move |rec| match rec {
            Ok(rec) => rec.deserialize::<RawRecord>(Some(&headers)).map_err(|e| RowError::Malformed(e.to_string())),
            Err(e) if e.is_io_error() => Err(RowError::Unreadable(e.to_string())),
            Err(e) => Err(RowError::Malformed(e.to_string())),
        })))
    }

    fn jsonl_rows(&self) -> Result<RowIter<'_>> {
        let reader = BufReader::new(self.open_file()?);
        Ok(Box::new(reader.lines().filter_map(|line| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(serde_json::from_str::<RawRecord>(&line).map_err(|e| RowError::Malformed(e.to_string()))),
            Err(e) => Some(Err(RowError::Unreadable(e.to_string()))),
        })))
    }

    fn json_rows(&self) -> Result<RowIter<'_>> {
        let json: serde_json::Value = serde_json::from_reader(BufReader::new(self.open_file()?))
            .map_err(|e| SearchError::Source(format!("{}: {e}", self.path.display())))?;
        let values = match json {
            serde_json::Value::Array(arr) => arr,
            obj @ serde_json::Value::Object(_) => vec![obj],
            _ => return Err(SearchError::Source("expected an array or an object of records".into())),
        };
        Ok(Box::new(
            values
                .into_iter()
                .map(|v| serde_json::from_value::<RawRecord>(v).map_err(|e| RowError::Malformed(e.to_string()))),
        ))
    }
}

impl RecordSource for FileSource {
    fn rows(&self) -> Result<RowIter<'_>> {
        match self.format {
            Format::Csv => self.csv_rows(),
            Format::Json => self.json_rows(),
            Format::Jsonl => self.jsonl_rows(),
        }
    }
}
