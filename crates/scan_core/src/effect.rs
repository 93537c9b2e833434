use crate::{
    CapturedImage, DeviceKind, HistoryRecord, PreviewId, SessionToken, StreamHandle,
    SubmissionRequest,
};

/// Side effects requested by [`crate::update`]. Effects are executed in the
/// order they are returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Acquire {
        token: SessionToken,
        kind: DeviceKind,
    },
    Release {
        handle: StreamHandle,
    },
    StartDecoder {
        token: SessionToken,
        handle: StreamHandle,
    },
    StopDecoder {
        token: SessionToken,
    },
    CaptureFrame {
        token: SessionToken,
        handle: StreamHandle,
    },
    PublishPreview {
        preview: PreviewId,
        image: CapturedImage,
    },
    RevokePreview {
        preview: PreviewId,
    },
    Submit {
        token: SessionToken,
        request: SubmissionRequest,
    },
    RecordHistory(HistoryRecord),
}
