use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::client::{ClientSettings, ReqwestProviderClient};
use crate::decode::PathDecoder;
use crate::ledger::{Clock, JsonlFailureLedger};
use crate::runner::{run_job, ChannelProgressSink, JobContext};
use crate::sink::CsvRowSink;
use crate::status::JsonlStatusLog;
use crate::{CallError, EngineEvent, Job};

enum EngineCommand {
    Enqueue { job: Job },
}

/// Settings shared by every job the engine runs. The ledger and status
/// files are the only cross-job resources; their writes are job-keyed.
pub struct EngineConfig {
    pub client: ClientSettings,
    pub backoff: Duration,
    pub ledger_path: PathBuf,
    pub status_path: PathBuf,
    pub clock: Clock,
}

impl EngineConfig {
    /// Defaults, with the shared log files placed under `log_dir`. The
    /// embedding application is expected to replace `clock`.
    pub fn default_with_logs(log_dir: &Path) -> Self {
        Self {
            client: ClientSettings::default(),
            backoff: Duration::from_secs(5),
            ledger_path: log_dir.join("failures.jsonl"),
            status_path: log_dir.join("status.jsonl"),
            clock: Arc::new(String::new),
        }
    }
}

/// Handle over a worker thread that runs each enqueued job as its own
/// task. One job is always driven by exactly one engine instance;
/// parallelism only ever happens across jobs.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, CallError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let client = Arc::new(ReqwestProviderClient::new(config.client.clone())?);
        let ledger = Arc::new(JsonlFailureLedger::new(
            config.ledger_path.clone(),
            config.clock.clone(),
        ));
        let status = Arc::new(JsonlStatusLog::new(
            config.status_path.clone(),
            config.clock.clone(),
        ));
        let backoff = config.backoff;

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let client = client.clone();
                let ledger = ledger.clone();
                let status = status.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(command, client, ledger, status, backoff, event_tx).await;
                });
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn enqueue(&self, job: Job) {
        let _ = self.cmd_tx.send(EngineCommand::Enqueue { job });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

async fn handle_command(
    command: EngineCommand,
    client: Arc<ReqwestProviderClient>,
    ledger: Arc<JsonlFailureLedger>,
    status: Arc<JsonlStatusLog>,
    backoff: Duration,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Enqueue { job } => {
            let decoder = PathDecoder::for_provider(&job.provider);
            let sink = CsvRowSink::new(job.output_path.clone(), job.provider.delimiter as u8);
            let ctx = JobContext {
                client: client.as_ref(),
                decoder: &decoder,
                sink: &sink,
                ledger: ledger.as_ref(),
                status: status.as_ref(),
                backoff,
            };
            let progress = ChannelProgressSink::new(event_tx.clone());
            let outcome = run_job(&job, &ctx, &progress).await;
            let _ = event_tx.send(EngineEvent::JobCompleted {
                job_id: job.id,
                outcome,
            });
        }
    }
}
