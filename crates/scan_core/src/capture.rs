use std::fmt;

/// Generation token attached to every capture session and submission.
/// Completions carrying a token that is no longer current are discarded.
pub type SessionToken = u64;

/// Identifier of a published image preview (the object-URL of a still).
pub type PreviewId = u64;

/// Opaque handle to a live device stream, minted by the resource manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamHandle(u64);

impl StreamHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// Physical device kinds that can back a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceKind {
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    BarcodeLive,
    CameraCapture,
    FileUpload,
}

impl CaptureMode {
    /// Device the mode needs while it is active, if any.
    pub fn device(self) -> Option<DeviceKind> {
        match self {
            CaptureMode::BarcodeLive | CaptureMode::CameraCapture => Some(DeviceKind::Camera),
            CaptureMode::FileUpload => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera unavailable")]
    DeviceUnavailable,
    #[error("camera not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("stream is closed")]
    StreamClosed,
    #[error("frame capture failed: {0}")]
    Device(String),
}

/// A still image, either materialized from a live stream or chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl CapturedImage {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Lifetime of one exclusively held device stream.
///
/// `active` implies `stream_handle.is_some()`. A session is created pending
/// (no handle yet) when a device mode is entered and becomes active once the
/// resource manager grants a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSession {
    pub mode: CaptureMode,
    pub token: SessionToken,
    stream_handle: Option<StreamHandle>,
    active: bool,
}

impl CaptureSession {
    pub(crate) fn pending(mode: CaptureMode, token: SessionToken) -> Self {
        Self {
            mode,
            token,
            stream_handle: None,
            active: false,
        }
    }

    pub(crate) fn bind(&mut self, handle: StreamHandle) {
        self.stream_handle = Some(handle);
        self.active = true;
    }

    /// Detaches the handle so the caller can release it. The session is
    /// inactive afterwards.
    pub(crate) fn take_handle(&mut self) -> Option<StreamHandle> {
        self.active = false;
        self.stream_handle.take()
    }

    pub fn stream_handle(&self) -> Option<StreamHandle> {
        self.stream_handle
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
