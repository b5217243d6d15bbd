use wizard_core::{update, AppState, DebounceSlot, FormDefinition, Msg, ScoreFailure};

#[test]
fn superseded_timer_changes_nothing() {
    let state = AppState::new(&FormDefinition::job_posting());
    let (next, effects) = update(
        state.clone(),
        Msg::QuietPeriodElapsed {
            slot: DebounceSlot::Shared,
            token: 7,
        },
    );

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn unknown_score_response_changes_nothing() {
    let state = AppState::new(&FormDefinition::job_posting());
    let (next, effects) = update(
        state.clone(),
        Msg::ScoreArrived {
            request_id: 3,
            result: Err(ScoreFailure::Timeout),
        },
    );

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn detaching_an_empty_slot_changes_nothing() {
    let state = AppState::new(&FormDefinition::job_posting());
    let (next, effects) = update(
        state.clone(),
        Msg::FileDetached {
            slot: "logo".to_string(),
        },
    );

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
