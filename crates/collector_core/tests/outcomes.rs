use collector_core::{
    derive_status, update, Effect, EngineState, JobPlan, Msg, OutcomeStatus,
};

#[test]
fn empty_plan_completes_immediately_as_no_data() {
    let plan = JobPlan {
        variants: 0,
        reducible: false,
    };
    let (state, effects) = EngineState::start(plan);
    assert!(state.is_done());
    assert_eq!(
        effects,
        vec![Effect::Complete {
            status: OutcomeStatus::NoData,
            rows_appended: 0,
        }]
    );
}

#[test]
fn all_variants_empty_is_no_data() {
    let plan = JobPlan {
        variants: 2,
        reducible: false,
    };
    let (state, _) = EngineState::start(plan);
    let (state, _) = update(state, Msg::EmptyPage);
    let (state, effects) = update(state, Msg::EmptyPage);
    assert!(state.is_done());
    assert_eq!(
        effects,
        vec![Effect::Complete {
            status: OutcomeStatus::NoData,
            rows_appended: 0,
        }]
    );
}

#[test]
fn recovered_retries_still_count_as_success() {
    let plan = JobPlan {
        variants: 1,
        reducible: false,
    };
    let (state, _) = EngineState::start(plan);
    let (state, _) = update(state, Msg::CallFailed);
    let (state, _) = update(state, Msg::EchoDetected);
    let (state, effects) = update(
        state,
        Msg::PageDecoded {
            rows: 8,
            total_count: Some(8),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::AppendRows,
            Effect::Complete {
                status: OutcomeStatus::Success,
                rows_appended: 8,
            },
        ]
    );
}

#[test]
fn messages_after_completion_are_ignored() {
    let plan = JobPlan {
        variants: 1,
        reducible: false,
    };
    let (state, _) = EngineState::start(plan);
    let (state, _) = update(state, Msg::EmptyPage);
    assert!(state.is_done());

    let before = state.clone();
    let (state, effects) = update(
        state,
        Msg::PageDecoded {
            rows: 10,
            total_count: Some(10),
        },
    );
    assert_eq!(state, before);
    assert!(effects.is_empty());
}

#[test]
fn status_derivation_matrix() {
    assert_eq!(derive_status(0, 0, false), OutcomeStatus::NoData);
    assert_eq!(derive_status(10, 0, false), OutcomeStatus::Success);
    assert_eq!(derive_status(10, 1, false), OutcomeStatus::Error);
    assert_eq!(derive_status(0, 1, false), OutcomeStatus::Error);
    assert_eq!(derive_status(0, 0, true), OutcomeStatus::Error);
    assert_eq!(derive_status(10, 0, true), OutcomeStatus::Error);
}
