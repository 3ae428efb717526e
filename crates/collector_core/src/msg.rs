/// Observed result of the in-flight provider call, fed back by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    /// Transport failure or a non-2xx response.
    CallFailed,
    /// 2xx response whose body was malformed or carried an echoed
    /// provider error wrapper.
    EchoDetected,
    /// Page decoded cleanly with zero rows.
    EmptyPage,
    /// Page decoded with at least one row. `total_count` is only
    /// meaningful on page 1 of a variant.
    PageDecoded {
        rows: u32,
        total_count: Option<u64>,
    },
}
