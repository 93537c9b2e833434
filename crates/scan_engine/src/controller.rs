use std::collections::VecDeque;
use std::sync::Arc;

use scan_core::{
    update, AcquisitionState, AcquisitionView, Effect, HistoryRecord, Msg, SessionToken,
    SubmissionRequest,
};
use scan_logging::{scan_debug, scan_info};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::decoder::{BarcodeDecoder, DecodeSink};
use crate::device::{CameraBackend, CaptureResourceManager, FacingMode};
use crate::preview::PreviewRegistry;
use crate::services::ServiceSet;

/// Receives completed acquisitions for the scan history.
pub trait HistorySink: Send + Sync {
    fn record(&self, record: HistoryRecord);
}

/// Runs the acquisition state machine against real resources.
///
/// Messages are applied one at a time. Device operations are awaited inline,
/// so their completions are handled before any other message. Network
/// submissions run as spawned tasks and report back through the controller's
/// channel together with decoder callbacks; [`Self::next_event`] picks those
/// up.
pub struct AcquisitionController {
    state: AcquisitionState,
    resources: CaptureResourceManager,
    decoder: Arc<dyn BarcodeDecoder>,
    services: ServiceSet,
    history: Arc<dyn HistorySink>,
    previews: PreviewRegistry,
    msg_tx: mpsc::UnboundedSender<Msg>,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
    shutdown: CancellationToken,
}

impl AcquisitionController {
    pub fn new(
        camera: Arc<dyn CameraBackend>,
        facing: FacingMode,
        decoder: Arc<dyn BarcodeDecoder>,
        services: ServiceSet,
        history: Arc<dyn HistorySink>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            state: AcquisitionState::new(),
            resources: CaptureResourceManager::new(camera, facing),
            decoder,
            services,
            history,
            previews: PreviewRegistry::new(),
            msg_tx,
            msg_rx,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn view(&self) -> AcquisitionView {
        self.state.view()
    }

    pub fn state(&self) -> &AcquisitionState {
        &self.state
    }

    pub fn resources(&self) -> &CaptureResourceManager {
        &self.resources
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Applies a message and every follow-up produced by its effects.
    pub async fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            for effect in effects {
                if let Some(follow_up) = self.run_effect(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    /// Waits for the next decoder or submission report and applies it.
    pub async fn next_event(&mut self) -> bool {
        match self.msg_rx.recv().await {
            Some(msg) => {
                self.dispatch(msg).await;
                true
            }
            None => false,
        }
    }

    /// Applies every report that has already arrived, without waiting.
    pub async fn drain_pending(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg).await;
        }
    }

    /// Waits until no submission is in flight.
    pub async fn settle(&mut self) {
        while self.state.in_flight_token().is_some() {
            if !self.next_event().await {
                break;
            }
        }
    }

    /// Tears the view down: releases every resource and abandons in-flight work.
    pub async fn shutdown(mut self) {
        self.dispatch(Msg::Teardown).await;
        self.shutdown.cancel();
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::Acquire { token, kind } => {
                scan_logging::set_session_token(token);
                match self.resources.acquire(kind).await {
                    Ok(handle) => Some(Msg::AcquireSucceeded { token, handle }),
                    Err(error) => Some(Msg::AcquireFailed { token, error }),
                }
            }
            Effect::Release { handle } => {
                self.resources.release(handle);
                None
            }
            Effect::StartDecoder { token, handle } => {
                scan_debug!("decoder start token={} on {}", token, handle);
                self.decoder
                    .start(DecodeSink::new(token, self.msg_tx.clone()));
                None
            }
            Effect::StopDecoder { token } => {
                scan_debug!("decoder stop token={}", token);
                self.decoder.stop();
                None
            }
            Effect::CaptureFrame { token, handle } => {
                match self.resources.capture_frame(handle).await {
                    Ok(image) => Some(Msg::FrameCaptured { token, image }),
                    Err(error) => Some(Msg::FrameCaptureFailed { token, error }),
                }
            }
            Effect::PublishPreview { preview, image } => {
                self.previews.publish(preview, image);
                None
            }
            Effect::RevokePreview { preview } => {
                self.previews.revoke(preview);
                None
            }
            Effect::Submit { token, request } => {
                self.spawn_submission(token, request);
                None
            }
            Effect::RecordHistory(record) => {
                self.history.record(record);
                None
            }
        }
    }

    fn spawn_submission(&self, token: SessionToken, request: SubmissionRequest) {
        scan_logging::set_session_token(token);
        scan_info!("submitting {:?}", request.kind());
        let services = self.services.clone();
        let tx = self.msg_tx.clone();
        let cancelled = self.shutdown.clone();
        tokio::spawn(scan_logging::with_session_token(token, async move {
            let result = tokio::select! {
                biased;
                _ = cancelled.cancelled() => return,
                result = services.submit(&request) => result,
            };
            let _ = tx.send(Msg::SubmissionCompleted { token, result });
        }));
    }
}

impl Drop for AcquisitionController {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if self.resources.live_count() > 0 {
            self.decoder.stop();
        }
        self.resources.release_all();
        self.previews.revoke_all();
    }
}
