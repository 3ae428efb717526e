use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

use collector_core::{update, write_mode_for, Effect, EngineState, JobPlan, Msg, OutcomeStatus};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use thiserror::Error;

use crate::client::ProviderClient;
use crate::decode::ResponseDecoder;
use crate::ledger::{FailureLedger, JobRef, LedgerError};
use crate::params::{build_variants, ParamError};
use crate::raw::RawCapture;
use crate::sink::{RowSink, SinkError};
use crate::status::{StatusLog, Step, StepStatus};
use crate::{EngineEvent, Job, Outcome, Row};

pub const MSG_COLLECT_COMPLETE: &str = "collection complete";
pub const MSG_COLLECT_NO_DATA: &str = "collection complete, source has no data";
pub const MSG_COLLECT_ERROR: &str = "collection call error";

/// Faults that end a job at its boundary. Transport and decode problems
/// never appear here; they feed the retry machinery as messages instead.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Plan(#[from] ParamError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("state machine stopped without completing")]
    Stalled,
}

/// Collaborators one job borrows while it runs.
pub struct JobContext<'a> {
    pub client: &'a dyn ProviderClient,
    pub decoder: &'a dyn ResponseDecoder,
    pub sink: &'a dyn RowSink,
    pub ledger: &'a dyn FailureLedger,
    pub status: &'a dyn StatusLog,
    /// Fixed pause before retrying a transport failure.
    pub backoff: Duration,
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Run one job to its terminal outcome.
///
/// Nothing escapes this boundary: any fault becomes an Error outcome, and
/// every path writes exactly one terminal status entry (best-effort when
/// the status file itself is the failure).
pub async fn run_job(job: &Job, ctx: &JobContext<'_>, progress: &dyn ProgressSink) -> Outcome {
    let job_ref = JobRef {
        job_id: job.id,
        dataset: job.provider.dataset.clone(),
        window: job.window.label(),
    };

    let mut rows_written = 0u64;
    let status = match drive(job, &job_ref, ctx, progress, &mut rows_written).await {
        Ok(status) => status,
        Err(err) => {
            engine_error!("job {} aborted: {}", job.id, err);
            OutcomeStatus::Error
        }
    };

    let (step_status, message) = match status {
        OutcomeStatus::Success => (StepStatus::Complete, MSG_COLLECT_COMPLETE),
        OutcomeStatus::NoData => (StepStatus::Complete, MSG_COLLECT_NO_DATA),
        OutcomeStatus::Error => (StepStatus::Error, MSG_COLLECT_ERROR),
    };
    if let Err(err) = ctx.status.update(&job_ref, Step::Collect, step_status, message) {
        engine_error!("job {}: terminal status entry failed: {}", job.id, err);
    }

    engine_info!(
        "job {} ({}) finished: {:?}, {} rows -> {}",
        job.id,
        job.provider.dataset,
        status,
        rows_written,
        job.output_path.display()
    );
    Outcome {
        status,
        output_path: job.output_path.clone(),
        rows_written,
    }
}

async fn drive(
    job: &Job,
    job_ref: &JobRef,
    ctx: &JobContext<'_>,
    progress: &dyn ProgressSink,
    rows_written: &mut u64,
) -> Result<OutcomeStatus, JobError> {
    let mut variants = build_variants(&job.provider.params, &job.window)?;
    let plan = JobPlan {
        variants: variants.len() as u32,
        reducible: variants.len() == 1
            && variants.first().map(|v| v.is_reducible()).unwrap_or(false),
    };
    let raw = job.raw_path.as_ref().map(|path| RawCapture::new(path.clone()));
    let mut raw_stored = false;

    let (mut state, effects) = EngineState::start(plan);
    let mut pending: VecDeque<Effect> = effects.into();
    // The most recently decoded batch, waiting for its AppendRows effect.
    let mut batch: Vec<Row> = Vec::new();
    let mut batch_at = (0u32, 0u32);

    while let Some(effect) = pending.pop_front() {
        match effect {
            Effect::CallProvider { variant, page } => {
                let Some(current) = variants.get((variant - 1) as usize) else {
                    return Err(JobError::Stalled);
                };
                let msg = match ctx.client.call(&job.provider, current, page).await {
                    Err(err) => {
                        engine_warn!("job {} call v{}p{} failed: {}", job.id, variant, page, err);
                        Msg::CallFailed
                    }
                    Ok(response) => {
                        if let Some(raw) = &raw {
                            raw.store(&response.bytes, !raw_stored)?;
                            raw_stored = true;
                        }
                        match ctx
                            .decoder
                            .decode(&response.bytes, response.content_type.as_deref())
                        {
                            Err(err) => {
                                engine_warn!(
                                    "job {} decode v{}p{} rejected: {}",
                                    job.id,
                                    variant,
                                    page,
                                    err
                                );
                                Msg::EchoDetected
                            }
                            Ok(page_data) if page_data.rows.is_empty() => Msg::EmptyPage,
                            Ok(page_data) => {
                                let rows = page_data.rows.len() as u32;
                                batch = page_data.rows;
                                batch_at = (variant, page);
                                Msg::PageDecoded {
                                    rows,
                                    total_count: page_data.total_count,
                                }
                            }
                        }
                    }
                };
                let (next, effects) = update(state, msg);
                state = next;
                pending.extend(effects);
            }
            Effect::Backoff => tokio::time::sleep(ctx.backoff).await,
            Effect::ReduceParameter => {
                if let Some(first) = variants.first_mut() {
                    first.reduce();
                    engine_debug!("job {} reduced params to {:?}", job.id, first.params());
                }
            }
            Effect::AppendRows => {
                let mode = write_mode_for(ctx.sink.row_count()?);
                let appended = ctx.sink.append(&batch, mode)?;
                *rows_written += appended;
                progress.emit(EngineEvent::PageAppended {
                    job_id: job.id,
                    variant: batch_at.0,
                    page: batch_at.1,
                    rows: appended,
                });
            }
            Effect::RecordFailure { variant, page } => {
                engine_warn!("job {} quarantined v{}p{}", job.id, variant, page);
                ctx.ledger.record(job_ref, variant, page)?;
            }
            Effect::Complete { status, .. } => return Ok(status),
        }
    }
    Err(JobError::Stalled)
}
