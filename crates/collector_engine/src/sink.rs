use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use collector_core::WriteMode;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::Row;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), SinkError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| SinkError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(SinkError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| SinkError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| SinkError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file
/// then renaming, so an interrupted overwrite can never destroy the
/// previous file.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, SinkError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Replace existing file if present to keep determinism.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target)
            .map_err(|e| SinkError::Io(e.error))?;
        Ok(target)
    }
}

/// Append-only access to one job's delimited output file. The observed
/// row count is the authority behind the write-mode policy, so it must
/// never reflect rows a crashed append did not finish writing.
pub trait RowSink: Send + Sync {
    fn append(&self, rows: &[Row], mode: WriteMode) -> Result<u64, SinkError>;
    fn row_count(&self) -> Result<u64, SinkError>;
    fn path(&self) -> &Path;
}

pub struct CsvRowSink {
    path: PathBuf,
    delimiter: u8,
}

impl CsvRowSink {
    pub fn new(path: PathBuf, delimiter: u8) -> Self {
        Self { path, delimiter }
    }

    /// Serialize a whole batch in memory. Column order follows the first
    /// row; rows missing a column get an empty field.
    fn encode(&self, rows: &[Row], header: bool) -> Result<Vec<u8>, SinkError> {
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let columns: Vec<&str> = first.columns().collect();
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(Vec::new());
        if header {
            writer.write_record(&columns)?;
        }
        for row in rows {
            let record: Vec<&str> = columns
                .iter()
                .map(|column| row.get(column).unwrap_or(""))
                .collect();
            writer.write_record(&record)?;
        }
        writer
            .into_inner()
            .map_err(|err| SinkError::Io(err.into_error()))
    }
}

impl RowSink for CsvRowSink {
    fn append(&self, rows: &[Row], mode: WriteMode) -> Result<u64, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let buffer = self.encode(rows, mode.header)?;
        if mode.append {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            file.write_all(&buffer)?;
            file.flush()?;
            file.sync_all()?;
        } else {
            let dir = self
                .path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let filename = self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| SinkError::OutputDir("output path has no file name".into()))?;
            AtomicFileWriter::new(dir.to_path_buf()).write(&filename, &buffer)?;
        }
        Ok(rows.len() as u64)
    }

    fn row_count(&self) -> Result<u64, SinkError> {
        if !self.path.exists() {
            return Ok(0);
        }
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let mut record = csv::ByteRecord::new();
        let mut count = 0u64;
        // A torn trailing record from an interrupted append stops the
        // count instead of inflating it.
        loop {
            match reader.read_byte_record(&mut record) {
                Ok(true) => count += 1,
                Ok(false) => break,
                Err(_) => break,
            }
        }
        Ok(count)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
