use crate::view_model::AcquisitionView;
use crate::{
    AcquireError, AcquiredResult, AnalysisSummary, BarcodeError, CaptureError, CaptureMode,
    CaptureSession, CapturedImage, Effect, ManualEntryError, PreviewId, SessionToken,
    SubmissionError, SubmissionRequest,
};

/// Largest file accepted for upload (16 MiB).
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const ALLOWED_UPLOAD_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    BarcodeScanning,
    OcrCameraActive,
    FileSelected,
    Submitting,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileRejection {
    #[error("file is empty")]
    Empty,
    #[error("file type not allowed: {file_name}")]
    UnsupportedType { file_name: String },
    #[error("file too large ({actual} bytes, max {max_bytes})")]
    TooLarge { max_bytes: usize, actual: usize },
}

/// Checks a user-selected file against the upload rules.
pub fn check_upload(image: &CapturedImage) -> Result<(), FileRejection> {
    if image.bytes.is_empty() {
        return Err(FileRejection::Empty);
    }
    let extension = image
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    let allowed = extension
        .as_deref()
        .is_some_and(|ext| ALLOWED_UPLOAD_EXTENSIONS.contains(&ext));
    if !allowed {
        return Err(FileRejection::UnsupportedType {
            file_name: image.file_name.clone(),
        });
    }
    if image.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(FileRejection::TooLarge {
            max_bytes: MAX_UPLOAD_BYTES,
            actual: image.bytes.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("invalid file: {0}")]
    InvalidFile(#[from] FileRejection),
    #[error("invalid barcode: {0}")]
    InvalidBarcode(#[from] BarcodeError),
    #[error("invalid product entry: {0}")]
    InvalidEntry(#[from] ManualEntryError),
}

/// What the retry action does from the `Error` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    Resubmit(SubmissionRequest),
    Reacquire(CaptureMode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InFlight {
    pub token: SessionToken,
    pub request: SubmissionRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AcquisitionState {
    phase: ControllerState,
    mode: Option<CaptureMode>,
    session: Option<CaptureSession>,
    frame_pending: bool,
    next_token: SessionToken,
    next_preview: PreviewId,
    selected_file: Option<CapturedImage>,
    preview: Option<PreviewId>,
    decoded: Option<String>,
    in_flight: Option<InFlight>,
    retry: Option<RetryAction>,
    last_result: Option<AcquiredResult>,
    analysis: Option<AnalysisSummary>,
    error: Option<ControllerError>,
    dirty: bool,
}

impl AcquisitionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AcquisitionView {
        AcquisitionView {
            phase: self.phase,
            mode: self.mode,
            acquiring: self.session.as_ref().is_some_and(|s| !s.is_active()),
            stream: self.session.as_ref().and_then(CaptureSession::stream_handle),
            preview: self.preview,
            selected_file: self.selected_file.as_ref().map(|f| f.file_name.clone()),
            decoded: self.decoded.clone(),
            submitting: self.in_flight.as_ref().map(|f| f.request.kind()),
            last_result: self.last_result.clone(),
            analysis: self.analysis.clone(),
            error: self.error.clone(),
            mode_selector_enabled: self.phase != ControllerState::Submitting,
            retry_available: self.phase == ControllerState::Error && self.retry.is_some(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> ControllerState {
        self.phase
    }

    pub fn mode(&self) -> Option<CaptureMode> {
        self.mode
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Token of the in-flight submission, if any.
    pub fn in_flight_token(&self) -> Option<SessionToken> {
        self.in_flight.as_ref().map(|f| f.token)
    }

    /// Returns whether the view changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_phase(&mut self, phase: ControllerState) {
        if self.phase != phase {
            scan_logging::scan_debug!("controller: {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
        self.dirty = true;
    }

    pub(crate) fn set_mode(&mut self, mode: Option<CaptureMode>) {
        self.mode = mode;
    }

    pub(crate) fn issue_token(&mut self) -> SessionToken {
        self.next_token += 1;
        self.next_token
    }

    pub(crate) fn open_session(&mut self, mode: CaptureMode) -> SessionToken {
        let token = self.issue_token();
        self.session = Some(CaptureSession::pending(mode, token));
        self.frame_pending = false;
        token
    }

    pub(crate) fn session_mut(&mut self, token: SessionToken) -> Option<&mut CaptureSession> {
        self.session.as_mut().filter(|s| s.token == token)
    }

    /// Drops the session, stopping the decoder and releasing its stream.
    pub(crate) fn close_session(&mut self, effects: &mut Vec<Effect>) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.is_active() && session.mode == crate::CaptureMode::BarcodeLive {
            effects.push(Effect::StopDecoder {
                token: session.token,
            });
        }
        if let Some(handle) = session.take_handle() {
            effects.push(Effect::Release { handle });
        }
        self.frame_pending = false;
        self.dirty = true;
    }

    pub(crate) fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    pub(crate) fn set_frame_pending(&mut self, pending: bool) {
        self.frame_pending = pending;
    }

    /// Clears the selected file, preview and decoded buffer.
    pub(crate) fn clear_transient(&mut self, effects: &mut Vec<Effect>) {
        self.selected_file = None;
        self.decoded = None;
        if let Some(preview) = self.preview.take() {
            effects.push(Effect::RevokePreview { preview });
        }
        self.dirty = true;
    }

    /// Publishes a preview for `image`, revoking the one it supersedes.
    pub(crate) fn show_preview(&mut self, image: &CapturedImage, effects: &mut Vec<Effect>) {
        if let Some(previous) = self.preview.take() {
            effects.push(Effect::RevokePreview { preview: previous });
        }
        self.next_preview += 1;
        let preview = self.next_preview;
        self.preview = Some(preview);
        effects.push(Effect::PublishPreview {
            preview,
            image: image.clone(),
        });
    }

    pub(crate) fn select_file(&mut self, image: CapturedImage) {
        self.selected_file = Some(image);
    }

    pub(crate) fn selected_file(&self) -> Option<&CapturedImage> {
        self.selected_file.as_ref()
    }

    pub(crate) fn set_decoded(&mut self, code: String) {
        self.decoded = Some(code);
    }

    pub(crate) fn begin_submission(
        &mut self,
        request: SubmissionRequest,
        effects: &mut Vec<Effect>,
    ) -> SessionToken {
        // A submission never overlaps a capture session.
        self.close_session(effects);
        let token = self.issue_token();
        self.in_flight = Some(InFlight {
            token,
            request: request.clone(),
        });
        self.error = None;
        self.retry = None;
        self.set_phase(ControllerState::Submitting);
        effects.push(Effect::Submit { token, request });
        token
    }

    /// Takes the in-flight submission if `token` is current.
    pub(crate) fn finish_submission(&mut self, token: SessionToken) -> Option<InFlight> {
        if self.in_flight_token() == Some(token) {
            self.in_flight.take()
        } else {
            None
        }
    }

    /// Forgets the in-flight submission so its result is discarded on arrival.
    pub(crate) fn abandon_submission(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            scan_logging::scan_debug!(
                "controller: abandoning submission token={}",
                in_flight.token
            );
        }
    }

    pub(crate) fn fail(&mut self, error: ControllerError, retry: Option<RetryAction>) {
        scan_logging::scan_warn!("controller error: {}", error);
        self.error = Some(error);
        self.retry = retry;
        self.set_phase(ControllerState::Error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
        self.retry = None;
    }

    pub(crate) fn take_retry(&mut self) -> Option<RetryAction> {
        self.retry.take()
    }

    pub(crate) fn last_result(&self) -> Option<&AcquiredResult> {
        self.last_result.as_ref()
    }

    pub(crate) fn set_last_result(&mut self, result: AcquiredResult) {
        self.last_result = Some(result);
        self.analysis = None;
    }

    pub(crate) fn set_analysis(&mut self, summary: AnalysisSummary) {
        self.analysis = Some(summary);
    }

    pub(crate) fn clear_results(&mut self) {
        self.last_result = None;
        self.analysis = None;
    }
}
