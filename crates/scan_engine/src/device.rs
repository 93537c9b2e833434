use std::collections::BTreeMap;
use std::sync::Arc;

use scan_core::{AcquireError, CaptureError, CapturedImage, DeviceKind, StreamHandle};
use scan_logging::{scan_debug, scan_info, scan_warn};

/// Which camera to prefer when several are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Rear camera on phones; best for labels.
    #[default]
    Environment,
    User,
    Any,
}

/// A live stream bound to a physical device.
#[async_trait::async_trait]
pub trait DeviceStream: Send {
    /// Materializes the current frame as a still image.
    async fn capture_frame(&mut self) -> Result<CapturedImage, CaptureError>;

    /// Stops every track of the stream. Called exactly once per stream.
    fn stop(&mut self);
}

#[async_trait::async_trait]
pub trait CameraBackend: Send + Sync {
    async fn open(
        &self,
        kind: DeviceKind,
        facing: FacingMode,
    ) -> Result<Box<dyn DeviceStream>, AcquireError>;
}

/// Backend for hosts without a camera. Every request is `Unsupported`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCamera;

#[async_trait::async_trait]
impl CameraBackend for UnavailableCamera {
    async fn open(
        &self,
        _kind: DeviceKind,
        _facing: FacingMode,
    ) -> Result<Box<dyn DeviceStream>, AcquireError> {
        Err(AcquireError::Unsupported)
    }
}

struct Outstanding {
    handle: StreamHandle,
    stream: Box<dyn DeviceStream>,
}

/// Owns at most one outstanding stream per device kind.
///
/// A second `acquire` for a kind that is already held stops the existing
/// stream first. `release` is idempotent. Dropping the manager stops every
/// stream it still holds.
pub struct CaptureResourceManager {
    backend: Arc<dyn CameraBackend>,
    facing: FacingMode,
    next_handle: u64,
    outstanding: BTreeMap<DeviceKind, Outstanding>,
}

impl CaptureResourceManager {
    pub fn new(backend: Arc<dyn CameraBackend>, facing: FacingMode) -> Self {
        Self {
            backend,
            facing,
            next_handle: 0,
            outstanding: BTreeMap::new(),
        }
    }

    pub async fn acquire(&mut self, kind: DeviceKind) -> Result<StreamHandle, AcquireError> {
        if let Some(previous) = self.outstanding.remove(&kind) {
            scan_warn!(
                "acquire {:?}: force-releasing outstanding {}",
                kind,
                previous.handle
            );
            stop(previous);
        }

        let stream = match self.backend.open(kind, self.facing).await {
            Ok(stream) => stream,
            Err(err) => {
                scan_warn!("acquire {:?} failed: {}", kind, err);
                return Err(err);
            }
        };

        self.next_handle += 1;
        let handle = StreamHandle::new(self.next_handle);
        scan_info!("acquired {} for {:?} ({:?})", handle, kind, self.facing);
        self.outstanding.insert(kind, Outstanding { handle, stream });
        Ok(handle)
    }

    /// Stops the stream behind `handle`. Unknown or already released handles
    /// are ignored.
    pub fn release(&mut self, handle: StreamHandle) {
        let kind = self
            .outstanding
            .iter()
            .find(|(_, held)| held.handle == handle)
            .map(|(kind, _)| *kind);
        match kind.and_then(|kind| self.outstanding.remove(&kind)) {
            Some(held) => stop(held),
            None => scan_debug!("release {}: not outstanding", handle),
        }
    }

    pub fn release_all(&mut self) {
        while let Some((_, held)) = self.outstanding.pop_first() {
            stop(held);
        }
    }

    pub async fn capture_frame(
        &mut self,
        handle: StreamHandle,
    ) -> Result<CapturedImage, CaptureError> {
        let held = self
            .outstanding
            .values_mut()
            .find(|held| held.handle == handle)
            .ok_or(CaptureError::StreamClosed)?;
        held.stream.capture_frame().await
    }

    pub fn outstanding(&self, kind: DeviceKind) -> Option<StreamHandle> {
        self.outstanding.get(&kind).map(|held| held.handle)
    }

    pub fn live_count(&self) -> usize {
        self.outstanding.len()
    }
}

impl Drop for CaptureResourceManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

fn stop(mut held: Outstanding) {
    held.stream.stop();
    scan_info!("released {}", held.handle);
}
