use crate::{total_pages_for, Effect, EngineState, Msg, REDUCTION_LIMIT, RETRY_LIMIT};

/// Pure update function: applies one call result to the state and returns
/// the effects the driver must execute next.
///
/// Messages arriving after completion are ignored, so a driver that keeps
/// feeding stale results cannot reopen a sealed job.
pub fn update(mut state: EngineState, msg: Msg) -> (EngineState, Vec<Effect>) {
    if state.is_done() {
        return (state, Vec::new());
    }
    let effects = match msg {
        Msg::CallFailed => retry(&mut state, true),
        Msg::EchoDetected => retry(&mut state, false),
        Msg::EmptyPage => empty_page(&mut state),
        Msg::PageDecoded { rows, total_count } => page_decoded(&mut state, rows, total_count),
    };
    (state, effects)
}

fn retry(state: &mut EngineState, with_backoff: bool) -> Vec<Effect> {
    state.cursor.retries += 1;
    if state.cursor.retries < RETRY_LIMIT {
        let call = call_current(state);
        return if with_backoff {
            vec![Effect::Backoff, call]
        } else {
            vec![call]
        };
    }
    quarantine(state)
}

/// Retry budget spent for the current (variant, page) pair.
///
/// A single-variant job has nowhere left to go and terminates without a
/// ledger entry. A multi-variant job records the pair and skips past it.
fn quarantine(state: &mut EngineState) -> Vec<Effect> {
    if state.plan.variants == 1 {
        state.mark_exhausted();
        return vec![state.complete()];
    }

    let mut effects = vec![Effect::RecordFailure {
        variant: state.cursor.variant,
        page: state.cursor.page,
    }];
    state.failure_records += 1;

    if state.cursor.page < state.cursor.total_pages {
        state.cursor.page += 1;
        state.cursor.retries = 0;
        effects.push(call_current(state));
    } else if state.cursor.variant < state.plan.variants {
        state.cursor.variant += 1;
        state.cursor.page = 1;
        state.cursor.retries = 0;
        effects.push(call_current(state));
    } else {
        effects.push(state.complete());
    }
    effects
}

fn empty_page(state: &mut EngineState) -> Vec<Effect> {
    let plan = state.plan;
    if plan.variants == 1 && plan.reducible && state.cursor.retries < REDUCTION_LIMIT {
        state.cursor.retries += 1;
        return vec![Effect::ReduceParameter, call_current(state)];
    }
    // A zero-row page is a completed page, not a failure.
    state.cursor.retries = 0;
    advance(state)
}

fn page_decoded(state: &mut EngineState, rows: u32, total_count: Option<u64>) -> Vec<Effect> {
    state.cursor.retries = 0;
    if state.cursor.page == 1 {
        state.cursor.total_pages = total_pages_for(total_count.unwrap_or(0), rows);
    }
    state.rows_appended += u64::from(rows);
    let mut effects = vec![Effect::AppendRows];
    effects.extend(advance(state));
    effects
}

fn advance(state: &mut EngineState) -> Vec<Effect> {
    if state.cursor.page < state.cursor.total_pages {
        state.cursor.page += 1;
        vec![call_current(state)]
    } else if state.cursor.variant < state.plan.variants {
        state.cursor.variant += 1;
        state.cursor.page = 1;
        vec![call_current(state)]
    } else {
        vec![state.complete()]
    }
}

fn call_current(state: &EngineState) -> Effect {
    Effect::CallProvider {
        variant: state.cursor.variant,
        page: state.cursor.page,
    }
}
