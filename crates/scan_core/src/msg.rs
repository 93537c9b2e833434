use crate::{
    AcquireError, CaptureError, CaptureMode, CapturedImage, ManualProduct, SessionToken,
    StreamHandle, SubmissionError, SubmissionOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User switched tabs. Always a hard reset of the previous mode.
    ModeSelected(CaptureMode),
    /// Resource manager granted a stream for the session.
    AcquireSucceeded {
        token: SessionToken,
        handle: StreamHandle,
    },
    /// Resource manager could not grant a stream.
    AcquireFailed {
        token: SessionToken,
        error: AcquireError,
    },
    /// Decoder reported a barcode. May arrive more than once, or after stop.
    CodeDecoded { token: SessionToken, code: String },
    /// User pressed the capture button in OCR camera mode.
    CaptureClicked,
    /// A still was materialized from the live stream.
    FrameCaptured {
        token: SessionToken,
        image: CapturedImage,
    },
    FrameCaptureFailed {
        token: SessionToken,
        error: CaptureError,
    },
    /// User picked a file in upload mode.
    FileChosen(CapturedImage),
    /// User submitted the selected file.
    SubmitClicked,
    /// User typed a barcode instead of scanning it.
    ManualCodeSubmitted(String),
    /// User entered a product the lookup did not know.
    ManualProductSubmitted(ManualProduct),
    /// User asked for a health analysis of the last result's ingredients.
    AnalyzeClicked,
    /// A submitted request finished.
    SubmissionCompleted {
        token: SessionToken,
        result: Result<SubmissionOutcome, SubmissionError>,
    },
    RetryClicked,
    CancelClicked,
    /// Like cancel, but also clears results.
    ResetClicked,
    /// Owning view is going away.
    Teardown,
    /// Fallback for placeholder wiring.
    NoOp,
}
