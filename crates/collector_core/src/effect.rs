use crate::OutcomeStatus;

/// Side effects requested by the machine. The driver executes them in
/// order and feeds call results back as the next [`crate::Msg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Call the provider for the given (variant, page) pair.
    CallProvider { variant: u32, page: u32 },
    /// Pause for the fixed transport backoff before the next call.
    Backoff,
    /// Apply one reduction step to the single variant's parameter.
    ReduceParameter,
    /// Append the just-decoded batch through the row sink.
    AppendRows,
    /// Record a permanently failed (variant, page) pair in the ledger.
    RecordFailure { variant: u32, page: u32 },
    /// Terminal: the job is finished; no further effects follow.
    Complete {
        status: OutcomeStatus,
        rows_appended: u64,
    },
}
