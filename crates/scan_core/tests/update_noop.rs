use scan_core::{update, AcquisitionState, Msg};

#[test]
fn update_is_noop() {
    let state = AcquisitionState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn idle_controls_are_noops() {
    for msg in [Msg::CaptureClicked, Msg::SubmitClicked, Msg::RetryClicked, Msg::AnalyzeClicked] {
        let state = AcquisitionState::new();
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(state, next);
        assert!(effects.is_empty());
    }
}
