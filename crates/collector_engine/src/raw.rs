use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::sink::{AtomicFileWriter, SinkError};

/// Raw payload capture alongside the delimited output: every fetched
/// page body for a job lands in one sibling file, for audits and replay.
pub struct RawCapture {
    path: PathBuf,
}

impl RawCapture {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store one page body. The job's first capture replaces any stale
    /// file from an earlier run; later pages append, newline-separated.
    pub fn store(&self, bytes: &[u8], first: bool) -> Result<(), SinkError> {
        if first {
            let dir = self
                .path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let filename = self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| SinkError::OutputDir("raw path has no file name".into()))?;
            AtomicFileWriter::new(dir.to_path_buf()).write(&filename, bytes)?;
        } else {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            file.write_all(b"\n")?;
            file.write_all(bytes)?;
            file.flush()?;
        }
        Ok(())
    }
}
