use crate::{
    AcquiredResult, AnalysisSummary, CaptureMode, ControllerError, ControllerState, PreviewId,
    StreamHandle, SubmissionKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AcquisitionView {
    pub phase: ControllerState,
    pub mode: Option<CaptureMode>,
    /// A camera grant has been requested but not yet answered.
    pub acquiring: bool,
    pub stream: Option<StreamHandle>,
    pub preview: Option<PreviewId>,
    pub selected_file: Option<String>,
    pub decoded: Option<String>,
    pub submitting: Option<SubmissionKind>,
    pub last_result: Option<AcquiredResult>,
    pub analysis: Option<AnalysisSummary>,
    pub error: Option<ControllerError>,
    pub mode_selector_enabled: bool,
    pub retry_available: bool,
    pub dirty: bool,
}
