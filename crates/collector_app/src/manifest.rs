use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use collector_engine::{AtomicFileWriter, JobId, Outcome, OutcomeStatus};
use serde_json::json;

pub const MANIFEST_FILENAME: &str = "outcomes.json";

/// Identity of one enqueued job, kept aside for the manifest.
pub struct JobMeta {
    pub id: JobId,
    pub dataset: String,
    pub window: String,
}

/// Write the packager handoff: one entry per job with its outcome and
/// the on-disk size of the delimited file.
pub fn write(
    output_dir: &Path,
    jobs: &[JobMeta],
    outcomes: &BTreeMap<JobId, Outcome>,
) -> anyhow::Result<PathBuf> {
    let entries: Vec<_> = jobs
        .iter()
        .map(|meta| {
            let outcome = outcomes.get(&meta.id);
            let file_size = outcome
                .and_then(|o| fs::metadata(&o.output_path).ok())
                .map(|m| m.len())
                .unwrap_or(0);
            json!({
                "job_id": meta.id,
                "dataset": meta.dataset,
                "window": meta.window,
                "status": outcome.map(|o| status_label(o.status)),
                "rows_written": outcome.map(|o| o.rows_written),
                "output_file": outcome.map(|o| o.output_path.to_string_lossy().into_owned()),
                "file_size": file_size,
            })
        })
        .collect();
    let doc = json!({ "jobs": entries });

    let path = AtomicFileWriter::new(output_dir.to_path_buf())
        .write(MANIFEST_FILENAME, doc.to_string().as_bytes())
        .context("writing outcomes manifest")?;
    Ok(path)
}

fn status_label(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Success => "success",
        OutcomeStatus::NoData => "no_data",
        OutcomeStatus::Error => "error",
    }
}
