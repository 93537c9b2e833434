mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use scan_core::{
    AcquireError, AcquiredResult, CaptureMode, CapturedImage, ControllerError, ControllerState,
    HistoryRecord, ManualProduct, Msg, SafetyLevel, SubmissionError, SubmissionKind,
};
use scan_engine::{AcquisitionController, FacingMode, ServiceSet};
use tokio::sync::Notify;

use common::{cola, init_logging, CollectingHistory, FakeBackend, FakeCamera, TestDecoder, COLA};

struct Rig {
    controller: AcquisitionController,
    camera: FakeCamera,
    decoder: Arc<TestDecoder>,
    backend: Arc<FakeBackend>,
    history: Arc<CollectingHistory>,
}

fn rig_with(backend: FakeBackend) -> Rig {
    init_logging();
    let camera = FakeCamera::default();
    let decoder = Arc::new(TestDecoder::default());
    let backend = Arc::new(backend);
    let history = Arc::new(CollectingHistory::default());
    let controller = AcquisitionController::new(
        Arc::new(camera.clone()),
        FacingMode::Environment,
        decoder.clone(),
        ServiceSet::from_backend(backend.clone()),
        history.clone(),
    );
    Rig {
        controller,
        camera,
        decoder,
        backend,
        history,
    }
}

fn rig() -> Rig {
    rig_with(FakeBackend::default())
}

#[tokio::test]
async fn duplicate_decodes_release_once_and_submit_once() {
    let mut rig = rig();
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::BarcodeLive))
        .await;
    assert_eq!(rig.controller.view().phase, ControllerState::BarcodeScanning);
    assert_eq!(rig.camera.log.opened(), 1);
    assert_eq!(rig.decoder.started(), 1);

    rig.decoder.emit(COLA);
    rig.decoder.emit(COLA);
    assert!(rig.controller.next_event().await);
    assert_eq!(rig.controller.view().phase, ControllerState::Submitting);
    assert_eq!(rig.camera.log.live(), 0);

    rig.controller.settle().await;
    rig.controller.drain_pending().await;

    assert_eq!(rig.camera.log.stopped(), 1);
    assert_eq!(rig.decoder.stopped(), 1);
    assert_eq!(rig.backend.lookups.load(Ordering::SeqCst), 1);
    let view = rig.controller.view();
    assert_eq!(view.phase, ControllerState::Idle);
    assert_eq!(view.last_result, Some(AcquiredResult::Product(cola())));
    assert_eq!(
        rig.history.records(),
        vec![HistoryRecord::Barcode {
            code: COLA.to_string(),
            product_name: "Cola".to_string(),
            ingredients: cola().ingredients,
        }]
    );
}

#[tokio::test]
async fn late_decode_after_mode_switch_is_ignored() {
    let mut rig = rig();
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::BarcodeLive))
        .await;
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::FileUpload))
        .await;
    assert_eq!(rig.camera.log.live(), 0);

    rig.decoder.emit(COLA);
    rig.controller.drain_pending().await;

    let view = rig.controller.view();
    assert_eq!(view.phase, ControllerState::Idle);
    assert_eq!(view.mode, Some(CaptureMode::FileUpload));
    assert_eq!(view.submitting, None);
    assert_eq!(rig.backend.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ocr_capture_releases_camera_before_submitting() {
    let mut rig = rig();
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::CameraCapture))
        .await;
    assert_eq!(rig.controller.view().phase, ControllerState::OcrCameraActive);

    rig.controller.dispatch(Msg::CaptureClicked).await;
    let view = rig.controller.view();
    assert_eq!(view.phase, ControllerState::Submitting);
    assert_eq!(view.submitting, Some(SubmissionKind::Ocr));
    assert_eq!(rig.camera.log.live(), 0);
    assert_eq!(rig.controller.resources().live_count(), 0);
    assert_eq!(rig.controller.previews().live_count(), 1);

    rig.controller.settle().await;
    let view = rig.controller.view();
    assert_eq!(view.phase, ControllerState::Idle);
    assert!(matches!(view.last_result, Some(AcquiredResult::Ocr(_))));
    assert_eq!(rig.controller.previews().live_count(), 0);
    assert_eq!(
        rig.history.records(),
        vec![HistoryRecord::Ocr {
            ingredients: vec!["water".to_string(), "salt".to_string()],
            processing_millis: 420,
        }]
    );
}

#[tokio::test]
async fn switching_from_ocr_camera_to_upload_leaves_nothing_live() {
    let mut rig = rig();
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::CameraCapture))
        .await;
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::FileUpload))
        .await;

    assert_eq!(rig.camera.log.opened(), 1);
    assert_eq!(rig.camera.log.stopped(), 1);
    assert_eq!(rig.controller.resources().live_count(), 0);
    assert_eq!(rig.controller.previews().live_count(), 0);

    rig.controller
        .dispatch(Msg::FileChosen(CapturedImage::new(
            "label.png",
            "image/png",
            vec![0x89, b'P', b'N', b'G'],
        )))
        .await;
    assert_eq!(rig.controller.view().phase, ControllerState::FileSelected);
    assert_eq!(rig.controller.previews().live_count(), 1);

    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::BarcodeLive))
        .await;
    assert_eq!(rig.controller.previews().live_count(), 0);
    assert_eq!(rig.controller.resources().live_count(), 1);
    assert_eq!(rig.camera.log.live(), 1);
}

#[tokio::test]
async fn upload_then_analyze_reconciles_results() {
    let mut rig = rig();
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::FileUpload))
        .await;
    rig.controller
        .dispatch(Msg::FileChosen(CapturedImage::new(
            "label.jpg",
            "image/jpeg",
            vec![0xFF, 0xD8],
        )))
        .await;
    rig.controller.dispatch(Msg::SubmitClicked).await;
    rig.controller.settle().await;
    assert_eq!(rig.backend.ocr_calls.load(Ordering::SeqCst), 1);

    rig.controller
        .dispatch(Msg::ManualCodeSubmitted(COLA.to_string()))
        .await;
    rig.controller.settle().await;
    rig.controller.dispatch(Msg::AnalyzeClicked).await;
    rig.controller.settle().await;

    let analysis = rig.controller.view().analysis.expect("analysis summary");
    assert_eq!(analysis.matched, 3);
    assert_eq!(analysis.unmatched, 0);
    assert_eq!(analysis.counts.get(SafetyLevel::Caution), 1);
    assert_eq!(analysis.counts.get(SafetyLevel::Safe), 2);
    assert_eq!(rig.history.records().len(), 2);
}

#[tokio::test]
async fn response_after_cancel_is_discarded() {
    let hold = Arc::new(Notify::new());
    let mut rig = rig_with(FakeBackend::held(hold.clone()));

    rig.controller
        .dispatch(Msg::ManualCodeSubmitted(COLA.to_string()))
        .await;
    assert_eq!(rig.controller.view().phase, ControllerState::Submitting);

    rig.controller.dispatch(Msg::CancelClicked).await;
    assert_eq!(rig.controller.view().phase, ControllerState::Idle);

    hold.notify_one();
    assert!(rig.controller.next_event().await);

    let view = rig.controller.view();
    assert_eq!(view.phase, ControllerState::Idle);
    assert_eq!(view.last_result, None);
    assert!(rig.history.records().is_empty());
    assert_eq!(rig.backend.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_lookup_can_be_retried() {
    let backend = FakeBackend::default();
    backend.fail_lookups.store(1, Ordering::SeqCst);
    let mut rig = rig_with(backend);

    rig.controller
        .dispatch(Msg::ManualCodeSubmitted(COLA.to_string()))
        .await;
    rig.controller.settle().await;
    let view = rig.controller.view();
    assert_eq!(view.phase, ControllerState::Error);
    assert_eq!(
        view.error,
        Some(ControllerError::Submission(SubmissionError::HttpStatus(503)))
    );
    assert!(view.retry_available);

    rig.controller.dispatch(Msg::RetryClicked).await;
    rig.controller.settle().await;
    let view = rig.controller.view();
    assert_eq!(view.phase, ControllerState::Idle);
    assert_eq!(view.last_result, Some(AcquiredResult::Product(cola())));
    assert_eq!(rig.backend.lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_product_can_be_entered_by_hand() {
    let mut rig = rig();
    let unknown = "4006381333931";
    rig.controller
        .dispatch(Msg::ManualCodeSubmitted(unknown.to_string()))
        .await;
    rig.controller.settle().await;
    assert_eq!(
        rig.controller.view().last_result,
        Some(AcquiredResult::NotFound {
            barcode: unknown.to_string()
        })
    );

    rig.controller
        .dispatch(Msg::ManualProductSubmitted(ManualProduct {
            barcode: unknown.to_string(),
            name: "Highlighter".to_string(),
            ingredients_text: "ink and felt".to_string(),
            ..ManualProduct::default()
        }))
        .await;
    rig.controller.settle().await;

    let view = rig.controller.view();
    assert_eq!(view.phase, ControllerState::Idle);
    let Some(AcquiredResult::Product(product)) = view.last_result.clone() else {
        panic!("expected the entered product, got {:?}", view.last_result);
    };
    assert_eq!(product.ingredients, vec!["ink", "felt"]);
    assert_eq!(rig.backend.added.load(Ordering::SeqCst), 1);
    assert_eq!(
        rig.history.records(),
        vec![HistoryRecord::Barcode {
            code: unknown.to_string(),
            product_name: "Highlighter".to_string(),
            ingredients: vec!["ink".to_string(), "felt".to_string()],
        }]
    );
}

#[tokio::test]
async fn denied_camera_reports_error_and_retry_reacquires() {
    let mut rig = rig();
    rig.camera.log.deny.store(true, Ordering::SeqCst);
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::BarcodeLive))
        .await;

    let view = rig.controller.view();
    assert_eq!(view.phase, ControllerState::Error);
    assert_eq!(
        view.error,
        Some(ControllerError::Acquire(AcquireError::PermissionDenied))
    );
    assert_eq!(rig.decoder.started(), 0);

    rig.camera.log.deny.store(false, Ordering::SeqCst);
    rig.controller.dispatch(Msg::RetryClicked).await;
    assert_eq!(rig.controller.view().phase, ControllerState::BarcodeScanning);
    assert_eq!(rig.camera.log.live(), 1);
}

#[tokio::test]
async fn dropping_the_controller_releases_everything() {
    let mut rig = rig();
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::BarcodeLive))
        .await;
    assert_eq!(rig.camera.log.live(), 1);

    let Rig {
        controller,
        camera,
        decoder,
        ..
    } = rig;
    drop(controller);

    assert_eq!(camera.log.live(), 0);
    assert_eq!(decoder.stopped(), 1);
}

#[tokio::test]
async fn shutdown_abandons_in_flight_submission() {
    let hold = Arc::new(Notify::new());
    let mut rig = rig_with(FakeBackend::held(hold.clone()));
    rig.controller
        .dispatch(Msg::ModeSelected(CaptureMode::CameraCapture))
        .await;
    rig.controller.dispatch(Msg::CaptureClicked).await;
    assert_eq!(rig.controller.previews().live_count(), 1);

    let Rig {
        controller,
        camera,
        backend,
        history,
        ..
    } = rig;
    controller.shutdown().await;
    hold.notify_one();
    tokio::task::yield_now().await;

    assert_eq!(camera.log.live(), 0);
    assert!(history.records().is_empty());
    assert_eq!(backend.ocr_calls.load(Ordering::SeqCst), 0);
}
