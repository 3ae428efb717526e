use std::fmt;
use std::path::PathBuf;

use collector_core::OutcomeStatus;

use crate::params::{ParamSpec, Window};

pub type JobId = u64;

/// How a provider serializes its payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Xml,
}

/// Static description of one provider dataset: where to call, how to read
/// the payload, and how to lay out the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub dataset: String,
    pub base_url: String,
    pub format: PayloadFormat,
    /// Dot path to the row array inside the decoded payload.
    pub rows_path: String,
    /// Dot path to the total record count, read on page 1 only.
    pub total_path: Option<String>,
    /// Substring marking an echoed provider error inside a 2xx body.
    pub echo_marker: Option<String>,
    pub params: ParamSpec,
    pub page_param: String,
    pub size_param: String,
    pub page_size: u32,
    pub delimiter: char,
    /// Also keep the raw page bodies next to the delimited output.
    pub keep_raw: bool,
}

/// One harvest attempt for a provider + time-window unit.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub provider: ProviderConfig,
    pub window: Window,
    pub output_path: PathBuf,
    pub raw_path: Option<PathBuf>,
}

/// Flat row record: ordered (column, value) pairs as decoded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row(pub Vec<(String, String)>);

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

/// Rows decoded from one page, plus the page-1 total when the payload
/// carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPage {
    pub total_count: Option<u64>,
    pub rows: Vec<Row>,
}

/// Progress and completion events emitted while jobs run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PageAppended {
        job_id: JobId,
        variant: u32,
        page: u32,
        rows: u64,
    },
    JobCompleted {
        job_id: JobId,
        outcome: Outcome,
    },
}

/// Terminal result of one job, handed to the packaging stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub output_path: PathBuf,
    pub rows_written: u64,
}

/// A provider call that did not yield a usable 2xx response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError {
    pub kind: CallFailureKind,
    pub message: String,
}

impl CallError {
    pub fn new(kind: CallFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for CallFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFailureKind::InvalidUrl => write!(f, "invalid url"),
            CallFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            CallFailureKind::Timeout => write!(f, "timeout"),
            CallFailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            CallFailureKind::Network => write!(f, "network error"),
        }
    }
}
