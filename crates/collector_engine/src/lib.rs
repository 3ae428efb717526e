//! Collector engine: IO pipeline and effect execution around the core
//! harvest state machine.
mod client;
mod decode;
mod engine;
mod filename;
mod ledger;
mod params;
mod raw;
mod runner;
mod sink;
mod status;
mod text;
mod types;
mod xml;

pub use client::{CallResponse, ClientSettings, ProviderClient, ReqwestProviderClient};
pub use collector_core::{OutcomeStatus, WriteMode};
pub use decode::{DecodeError, PathDecoder, ResponseDecoder};
pub use engine::{EngineConfig, EngineHandle};
pub use filename::output_filename;
pub use ledger::{Clock, FailureLedger, JobRef, JsonlFailureLedger, LedgerError};
pub use params::{build_variants, ParamError, ParamSpec, Variant, Window};
pub use raw::RawCapture;
pub use runner::{
    run_job, ChannelProgressSink, JobContext, JobError, ProgressSink, MSG_COLLECT_COMPLETE,
    MSG_COLLECT_ERROR, MSG_COLLECT_NO_DATA,
};
pub use sink::{ensure_output_dir, AtomicFileWriter, CsvRowSink, RowSink, SinkError};
pub use status::{JsonlStatusLog, StatusLog, Step, StepStatus};
pub use text::{decode_text, DecodedText};
pub use types::{
    CallError, CallFailureKind, EngineEvent, Job, JobId, Outcome, PayloadFormat, ProviderConfig,
    Row, RowPage,
};
pub use xml::xml_to_value;
