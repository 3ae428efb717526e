/// Terminal classification of a job. Exactly one holds per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Rows were harvested and no (variant, page) pair was quarantined.
    Success,
    /// The job completed normally but the provider had nothing to return.
    NoData,
    /// A quarantined pair, a retry-exhausted termination, or a fault at
    /// the job boundary.
    Error,
}

/// Derive the terminal status from the machine's bookkeeping.
///
/// NoData requires a genuinely clean empty run: nothing appended, nothing
/// quarantined, and no retry budget spent to exhaustion at termination.
pub fn derive_status(rows_appended: u64, failure_records: u32, exhausted: bool) -> OutcomeStatus {
    if failure_records > 0 || exhausted {
        OutcomeStatus::Error
    } else if rows_appended == 0 {
        OutcomeStatus::NoData
    } else {
        OutcomeStatus::Success
    }
}
