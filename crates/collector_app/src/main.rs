mod config;
mod logging;
mod manifest;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use collector_engine::{
    ensure_output_dir, output_filename, EngineConfig, EngineEvent, EngineHandle, Job, JobId,
    Outcome, OutcomeStatus, PayloadFormat,
};
use engine_logging::{engine_error, engine_info, engine_warn};

use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "collector_app", about = "Batch harvest of tabular provider data")]
struct Args {
    /// RON run configuration.
    config: PathBuf,
    /// Override the configured output directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Where log output goes.
    #[arg(long, value_enum, default_value = "terminal")]
    log: LogArg,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LogArg {
    Terminal,
    File,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(value: LogArg) -> Self {
        match value {
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::File => LogDestination::File,
            LogArg::Both => LogDestination::Both,
        }
    }
}

fn main() {
    let args = Args::parse();
    logging::initialize(args.log.into());
    match run(args) {
        Ok(0) => {}
        Ok(_failed) => std::process::exit(1),
        Err(err) => {
            engine_error!("run aborted: {err:#}");
            eprintln!("collector_app: {err:#}");
            std::process::exit(2);
        }
    }
}

fn run(args: Args) -> anyhow::Result<usize> {
    let config = config::load(&args.config)?;
    let output_dir = args.output_dir.unwrap_or_else(|| config.output_dir.clone());
    ensure_output_dir(&output_dir).context("preparing output directory")?;
    let window = config.window.clone().into_window();

    let mut engine_config = EngineConfig::default_with_logs(&output_dir);
    if let Some(secs) = config.backoff_secs {
        engine_config.backoff = Duration::from_secs(secs);
    }
    engine_config.clock = Arc::new(|| Utc::now().to_rfc3339());
    let engine =
        EngineHandle::new(engine_config).map_err(|err| anyhow::anyhow!("http client: {err}"))?;

    let mut metas = Vec::new();
    for (index, entry) in config.providers.into_iter().enumerate() {
        let provider = entry.into_provider();
        let output_path = output_dir.join(output_filename(&provider.dataset, &window, "csv"));
        let raw_path = provider.keep_raw.then(|| {
            let extension = match provider.format {
                PayloadFormat::Json => "json",
                PayloadFormat::Xml => "xml",
            };
            output_dir.join(output_filename(&provider.dataset, &window, extension))
        });
        let id = index as JobId + 1;
        metas.push(manifest::JobMeta {
            id,
            dataset: provider.dataset.clone(),
            window: window.label(),
        });
        engine_info!("job {}: {} -> {}", id, provider.dataset, output_path.display());
        engine.enqueue(Job {
            id,
            provider,
            window: window.clone(),
            output_path,
            raw_path,
        });
    }

    let total = metas.len();
    let mut outcomes: BTreeMap<JobId, Outcome> = BTreeMap::new();
    while outcomes.len() < total {
        match engine.try_recv() {
            Some(EngineEvent::PageAppended {
                job_id,
                variant,
                page,
                rows,
            }) => {
                engine_info!("job {}: appended v{}p{} ({} rows)", job_id, variant, page, rows);
            }
            Some(EngineEvent::JobCompleted { job_id, outcome }) => {
                if outcome.status == OutcomeStatus::Error {
                    engine_warn!("job {} ended in error", job_id);
                }
                outcomes.insert(job_id, outcome);
            }
            None => thread::sleep(Duration::from_millis(20)),
        }
    }

    let manifest_path = manifest::write(&output_dir, &metas, &outcomes)?;
    let failed = outcomes
        .values()
        .filter(|outcome| outcome.status == OutcomeStatus::Error)
        .count();
    engine_info!(
        "run complete: {} jobs, {} failed, manifest {}",
        total,
        failed,
        manifest_path.display()
    );
    Ok(failed)
}
