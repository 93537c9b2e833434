//! Scan engine: device resources, decoder seam, backend services and the
//! effect runner that drives the pure acquisition state machine.
mod controller;
mod decoder;
mod device;
mod persist;
mod preview;
mod services;
mod wire;

pub use controller::{AcquisitionController, HistorySink};
pub use decoder::{BarcodeDecoder, DecodeSink, NullDecoder};
pub use device::{
    CameraBackend, CaptureResourceManager, DeviceStream, FacingMode, UnavailableCamera,
};
pub use persist::{ensure_dir, AtomicFileWriter, JsonStore, PersistError};
pub use preview::PreviewRegistry;
pub use services::{
    AnalysisService, LookupService, ManualProductService, OcrService, ReqwestBackend, ServiceSet,
    ServiceSettings,
};
