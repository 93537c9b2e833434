//! Scan core: pure acquisition state machine, ingredient reconciliation and
//! analysis aggregation.
mod aggregate;
mod barcode;
mod capture;
mod effect;
mod ingredients;
mod manual;
mod msg;
mod reconcile;
mod state;
mod types;
mod update;
mod view_model;

pub use aggregate::{summarize, AnalysisSummary, DetailStatus, IngredientDetail, SafetyCounts};
pub use barcode::{validate_ean13, BarcodeError};
pub use capture::{
    AcquireError, CaptureError, CaptureMode, CaptureSession, CapturedImage, DeviceKind, PreviewId,
    SessionToken, StreamHandle,
};
pub use effect::Effect;
pub use ingredients::{normalize_name, split_ingredients, tokenize_name};
pub use manual::{ManualEntryError, ManualProduct};
pub use msg::Msg;
pub use reconcile::{reconcile, MatchResult, MatchTier};
pub use state::{
    check_upload, AcquisitionState, ControllerError, ControllerState, FileRejection, RetryAction,
    ALLOWED_UPLOAD_EXTENSIONS, MAX_UPLOAD_BYTES,
};
pub use types::{
    AcquiredResult, AnalysisRecord, HistoryRecord, IngredientsSource, LookupOutcome, OcrResult,
    ProductRecord, SafetyLevel, SubmissionError, SubmissionKind, SubmissionOutcome,
    SubmissionRequest,
};
pub use update::update;
pub use view_model::AcquisitionView;
