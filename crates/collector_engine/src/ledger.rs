use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::JobId;

/// Wall-clock source injected by the embedding application; the engine
/// never reads the clock itself.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

/// Identifies one job in the shared ledger and status files. Parallel
/// jobs always carry distinct ids, so their records never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRef {
    pub job_id: JobId,
    pub dataset: String,
    pub window: String,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only record of permanently failed (variant, page) pairs,
/// consumed by a later reconciliation pass.
pub trait FailureLedger: Send + Sync {
    /// Record one exhausted pair. Called at most once per exhaustion
    /// event; the engine does not deduplicate across reruns.
    fn record(&self, job: &JobRef, variant: u32, page: u32) -> Result<(), LedgerError>;
}

pub struct JsonlFailureLedger {
    path: PathBuf,
    clock: Clock,
}

impl JsonlFailureLedger {
    pub fn new(path: PathBuf, clock: Clock) -> Self {
        Self { path, clock }
    }
}

#[derive(Serialize)]
struct FailureLine<'a> {
    ts: String,
    #[serde(flatten)]
    job: &'a JobRef,
    variant: u32,
    page: u32,
}

impl FailureLedger for JsonlFailureLedger {
    fn record(&self, job: &JobRef, variant: u32, page: u32) -> Result<(), LedgerError> {
        let line = serde_json::to_string(&FailureLine {
            ts: (self.clock)(),
            job,
            variant,
            page,
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
