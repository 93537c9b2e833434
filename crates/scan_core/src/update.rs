use scan_logging::{scan_debug, scan_warn};

use crate::state::InFlight;
use crate::{
    check_upload, reconcile, summarize, validate_ean13, AcquiredResult, AcquisitionState,
    CaptureMode, ControllerError, ControllerState, Effect, HistoryRecord, LookupOutcome, Msg,
    RetryAction, SubmissionOutcome, SubmissionRequest,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AcquisitionState, msg: Msg) -> (AcquisitionState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::ModeSelected(mode) => {
            if state.phase() == ControllerState::Submitting {
                scan_debug!("mode switch to {:?} rejected while submitting", mode);
                return (state, effects);
            }
            enter_mode(&mut state, mode, &mut effects);
        }
        Msg::AcquireSucceeded { token, handle } => {
            if state.phase() == ControllerState::Submitting {
                scan_debug!("grant {} arrived while submitting, releasing", handle);
                if state.session_mut(token).is_some() {
                    state.close_session(&mut effects);
                }
                effects.push(Effect::Release { handle });
                return (state, effects);
            }
            let bound = match state.session_mut(token) {
                Some(session) if !session.is_active() => {
                    session.bind(handle);
                    Some(session.mode)
                }
                _ => None,
            };
            match bound {
                Some(CaptureMode::BarcodeLive) => {
                    state.set_phase(ControllerState::BarcodeScanning);
                    effects.push(Effect::StartDecoder { token, handle });
                }
                Some(_) => state.set_phase(ControllerState::OcrCameraActive),
                None => {
                    // The session this grant was for is gone; hand it straight back.
                    scan_debug!("stale grant {} for token={}, releasing", handle, token);
                    effects.push(Effect::Release { handle });
                }
            }
        }
        Msg::AcquireFailed { token, error } => {
            let Some(mode) = state.session_mut(token).map(|s| s.mode) else {
                return (state, effects);
            };
            state.close_session(&mut effects);
            state.fail(error.into(), Some(RetryAction::Reacquire(mode)));
        }
        Msg::CodeDecoded { token, code } => {
            let current = state.phase() == ControllerState::BarcodeScanning
                && state.session().is_some_and(|s| s.token == token);
            if !current {
                scan_debug!("ignoring decode for token={} ({} chars)", token, code.len());
                return (state, effects);
            }
            state.set_decoded(code.clone());
            state.close_session(&mut effects);
            state.begin_submission(SubmissionRequest::Lookup { code }, &mut effects);
        }
        Msg::CaptureClicked => {
            if state.phase() != ControllerState::OcrCameraActive || state.frame_pending() {
                return (state, effects);
            }
            let target = state
                .session()
                .and_then(|s| s.stream_handle().map(|handle| (s.token, handle)));
            if let Some((token, handle)) = target {
                state.set_frame_pending(true);
                effects.push(Effect::CaptureFrame { token, handle });
            }
        }
        Msg::FrameCaptured { token, image } => {
            let current = state.phase() == ControllerState::OcrCameraActive
                && state.session().is_some_and(|s| s.token == token);
            if !current {
                scan_debug!("dropping frame for stale token={}", token);
                return (state, effects);
            }
            state.close_session(&mut effects);
            state.show_preview(&image, &mut effects);
            state.begin_submission(SubmissionRequest::Ocr { image }, &mut effects);
        }
        Msg::FrameCaptureFailed { token, error } => {
            if state.session().map(|s| s.token) != Some(token) {
                return (state, effects);
            }
            state.close_session(&mut effects);
            state.fail(
                error.into(),
                Some(RetryAction::Reacquire(CaptureMode::CameraCapture)),
            );
        }
        Msg::FileChosen(image) => {
            let accepting = matches!(
                state.phase(),
                ControllerState::Idle | ControllerState::FileSelected | ControllerState::Error
            );
            if state.mode() != Some(CaptureMode::FileUpload) || !accepting {
                scan_warn!("file '{}' ignored outside upload mode", image.file_name);
                return (state, effects);
            }
            state.clear_transient(&mut effects);
            if let Err(rejection) = check_upload(&image) {
                state.fail(rejection.into(), None);
                return (state, effects);
            }
            state.clear_error();
            state.show_preview(&image, &mut effects);
            state.select_file(image);
            state.set_phase(ControllerState::FileSelected);
        }
        Msg::SubmitClicked => {
            if state.phase() != ControllerState::FileSelected {
                return (state, effects);
            }
            if let Some(image) = state.selected_file().cloned() {
                state.begin_submission(SubmissionRequest::Ocr { image }, &mut effects);
            }
        }
        Msg::ManualCodeSubmitted(raw) => {
            if state.phase() == ControllerState::Submitting {
                scan_debug!("manual code rejected while submitting");
                return (state, effects);
            }
            let code = raw.trim().to_string();
            state.close_session(&mut effects);
            state.clear_transient(&mut effects);
            if let Err(err) = validate_ean13(&code) {
                state.fail(err.into(), None);
                return (state, effects);
            }
            state.begin_submission(SubmissionRequest::Lookup { code }, &mut effects);
        }
        Msg::ManualProductSubmitted(entry) => {
            if state.phase() == ControllerState::Submitting {
                scan_debug!("product entry rejected while submitting");
                return (state, effects);
            }
            state.close_session(&mut effects);
            state.clear_transient(&mut effects);
            match entry.validated() {
                Ok(product) => {
                    let request = SubmissionRequest::AddProduct { product };
                    state.begin_submission(request, &mut effects);
                }
                Err(err) => state.fail(err.into(), None),
            }
        }
        Msg::AnalyzeClicked => {
            if state.phase() != ControllerState::Idle {
                return (state, effects);
            }
            if state.session().is_some() {
                scan_debug!("analysis rejected while a camera session is open");
                return (state, effects);
            }
            let ingredients = state
                .last_result()
                .map(|result| result.ingredients().to_vec())
                .unwrap_or_default();
            if ingredients.is_empty() {
                scan_debug!("nothing to analyze");
                return (state, effects);
            }
            state.begin_submission(SubmissionRequest::Analyze { ingredients }, &mut effects);
        }
        Msg::SubmissionCompleted { token, result } => {
            let Some(in_flight) = state.finish_submission(token) else {
                scan_debug!("discarding stale submission result token={}", token);
                return (state, effects);
            };
            match result {
                Ok(outcome) => apply_outcome(&mut state, in_flight, outcome, &mut effects),
                Err(error) => {
                    state.fail(
                        ControllerError::Submission(error),
                        Some(RetryAction::Resubmit(in_flight.request)),
                    );
                }
            }
        }
        Msg::RetryClicked => {
            if state.phase() != ControllerState::Error {
                return (state, effects);
            }
            match state.take_retry() {
                Some(RetryAction::Resubmit(request)) => {
                    state.begin_submission(request, &mut effects);
                }
                Some(RetryAction::Reacquire(mode)) => {
                    state.clear_error();
                    enter_mode(&mut state, mode, &mut effects);
                }
                None => {}
            }
        }
        Msg::CancelClicked => {
            reset(&mut state, &mut effects);
        }
        Msg::ResetClicked => {
            reset(&mut state, &mut effects);
            state.clear_results();
        }
        Msg::Teardown => {
            reset(&mut state, &mut effects);
            state.clear_results();
            state.set_mode(None);
        }
        Msg::NoOp => {}
    }

    (state, effects)
}

/// Hard reset into `mode`: the previous session and transient input go first.
fn enter_mode(state: &mut AcquisitionState, mode: CaptureMode, effects: &mut Vec<Effect>) {
    state.close_session(effects);
    state.clear_transient(effects);
    state.clear_error();
    state.set_mode(Some(mode));
    state.set_phase(ControllerState::Idle);
    if let Some(kind) = mode.device() {
        let token = state.open_session(mode);
        effects.push(Effect::Acquire { token, kind });
    }
}

fn reset(state: &mut AcquisitionState, effects: &mut Vec<Effect>) {
    state.close_session(effects);
    state.clear_transient(effects);
    state.abandon_submission();
    state.clear_error();
    state.set_phase(ControllerState::Idle);
}

fn apply_outcome(
    state: &mut AcquisitionState,
    in_flight: InFlight,
    outcome: SubmissionOutcome,
    effects: &mut Vec<Effect>,
) {
    match outcome {
        SubmissionOutcome::Lookup(LookupOutcome::Found(product))
        | SubmissionOutcome::ProductAdded(product) => {
            effects.push(Effect::RecordHistory(HistoryRecord::Barcode {
                code: product.barcode.clone(),
                product_name: product.name.clone(),
                ingredients: product.ingredients.clone(),
            }));
            state.set_last_result(AcquiredResult::Product(product));
            state.clear_transient(effects);
        }
        SubmissionOutcome::Lookup(LookupOutcome::NotFound { barcode }) => {
            state.set_last_result(AcquiredResult::NotFound { barcode });
            state.clear_transient(effects);
        }
        SubmissionOutcome::Ocr(ocr) => {
            effects.push(Effect::RecordHistory(HistoryRecord::Ocr {
                ingredients: ocr.ingredients.clone(),
                processing_millis: ocr.processing_millis,
            }));
            state.set_last_result(AcquiredResult::Ocr(ocr));
            state.clear_transient(effects);
        }
        SubmissionOutcome::Analysis(records) => {
            // Reconcile against the names that were submitted, not whatever
            // the last result holds now.
            let ingredients = match in_flight.request {
                SubmissionRequest::Analyze { ingredients } => ingredients,
                _ => state
                    .last_result()
                    .map(|r| r.ingredients().to_vec())
                    .unwrap_or_default(),
            };
            let matches = reconcile(&ingredients, &records);
            state.set_analysis(summarize(&matches));
        }
    }
    state.mark_dirty();
    state.set_phase(ControllerState::Idle);
}
