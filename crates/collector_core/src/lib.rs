//! Collector core: pure harvest state machine and write-mode policy.
mod cursor;
mod effect;
mod msg;
mod outcome;
mod state;
mod update;
mod write_mode;

pub use cursor::{total_pages_for, Cursor, REDUCTION_LIMIT, RETRY_LIMIT};
pub use effect::Effect;
pub use msg::Msg;
pub use outcome::{derive_status, OutcomeStatus};
pub use state::{EngineState, JobPlan};
pub use update::update;
pub use write_mode::{write_mode_for, WriteMode};
