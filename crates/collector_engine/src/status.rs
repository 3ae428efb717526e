use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::ledger::{Clock, JobRef, LedgerError};

/// Pipeline step a status entry belongs to. Downstream stages (packaging,
/// transfer) own their own steps; the engine only ever reports collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Collect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Working,
    Complete,
    Error,
}

/// Append-only, strictly ordered per-job-step status record. Entries are
/// never rewritten.
pub trait StatusLog: Send + Sync {
    fn update(
        &self,
        job: &JobRef,
        step: Step,
        status: StepStatus,
        message: &str,
    ) -> Result<(), LedgerError>;
}

pub struct JsonlStatusLog {
    path: PathBuf,
    clock: Clock,
}

impl JsonlStatusLog {
    pub fn new(path: PathBuf, clock: Clock) -> Self {
        Self { path, clock }
    }
}

#[derive(Serialize)]
struct StatusLine<'a> {
    ts: String,
    #[serde(flatten)]
    job: &'a JobRef,
    step: Step,
    status: StepStatus,
    message: &'a str,
}

impl StatusLog for JsonlStatusLog {
    fn update(
        &self,
        job: &JobRef,
        step: Step,
        status: StepStatus,
        message: &str,
    ) -> Result<(), LedgerError> {
        let line = serde_json::to_string(&StatusLine {
            ts: (self.clock)(),
            job,
            step,
            status,
            message,
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}
