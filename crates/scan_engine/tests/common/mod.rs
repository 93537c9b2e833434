#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use scan_core::{
    AcquireError, AnalysisRecord, CaptureError, CapturedImage, DeviceKind, HistoryRecord,
    IngredientsSource, LookupOutcome, ManualProduct, OcrResult, ProductRecord, SafetyLevel,
    SubmissionError,
};
use scan_engine::{
    AnalysisService, BarcodeDecoder, CameraBackend, DecodeSink, DeviceStream, FacingMode,
    HistorySink, LookupService, ManualProductService, OcrService,
};
use tokio::sync::Notify;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scan_logging::initialize_for_tests);
}

/// Counts opens and stops so tests can check that no stream leaks.
#[derive(Default)]
pub struct CameraLog {
    pub opened: AtomicUsize,
    pub stopped: AtomicUsize,
    pub deny: AtomicBool,
}

impl CameraLog {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.opened() - self.stopped()
    }
}

#[derive(Default, Clone)]
pub struct FakeCamera {
    pub log: Arc<CameraLog>,
}

#[async_trait::async_trait]
impl CameraBackend for FakeCamera {
    async fn open(
        &self,
        _kind: DeviceKind,
        _facing: FacingMode,
    ) -> Result<Box<dyn DeviceStream>, AcquireError> {
        if self.log.deny.load(Ordering::SeqCst) {
            return Err(AcquireError::PermissionDenied);
        }
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            log: self.log.clone(),
            stopped: false,
        }))
    }
}

struct FakeStream {
    log: Arc<CameraLog>,
    stopped: bool,
}

#[async_trait::async_trait]
impl DeviceStream for FakeStream {
    async fn capture_frame(&mut self) -> Result<CapturedImage, CaptureError> {
        if self.stopped {
            return Err(CaptureError::StreamClosed);
        }
        Ok(CapturedImage::new(
            "capture.jpg",
            "image/jpeg",
            vec![0xFF, 0xD8, 0xFF, 0xE0],
        ))
    }

    fn stop(&mut self) {
        assert!(!self.stopped, "stream stopped twice");
        self.stopped = true;
        self.log.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Keeps the last sink it was given, even after `stop`, so tests can play a
/// late callback.
#[derive(Default)]
pub struct TestDecoder {
    sink: Mutex<Option<DecodeSink>>,
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
}

impl TestDecoder {
    pub fn emit(&self, code: &str) {
        let sink = self.sink.lock().unwrap();
        sink.as_ref().expect("decoder never started").decoded(code);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl BarcodeDecoder for TestDecoder {
    fn start(&self, sink: DecodeSink) {
        self.started.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock().unwrap() = Some(sink);
    }

    fn stop(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Canned backend. When `hold` is set every call waits for a permit first.
#[derive(Default)]
pub struct FakeBackend {
    pub hold: Option<Arc<Notify>>,
    pub lookups: AtomicUsize,
    pub ocr_calls: AtomicUsize,
    pub analyses: AtomicUsize,
    pub added: AtomicUsize,
    pub fail_lookups: AtomicUsize,
}

impl FakeBackend {
    pub fn held(notify: Arc<Notify>) -> Self {
        Self {
            hold: Some(notify),
            ..Self::default()
        }
    }

    async fn gate(&self) {
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
    }
}

pub const COLA: &str = "5000112637922";

pub fn cola() -> ProductRecord {
    ProductRecord {
        barcode: COLA.to_string(),
        name: "Cola".to_string(),
        brand: "Fizz Co".to_string(),
        countries: "-".to_string(),
        ingredients: vec![
            "Carbonated Water".to_string(),
            "Sugar".to_string(),
            "Caramel Color".to_string(),
        ],
        ingredients_source: Some(IngredientsSource::Structured),
        ingredient_image_url: None,
        source_db: Some("openfoodfacts".to_string()),
    }
}

#[async_trait::async_trait]
impl LookupService for FakeBackend {
    async fn lookup(&self, code: &str) -> Result<LookupOutcome, SubmissionError> {
        self.gate().await;
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) > 0 {
            self.fail_lookups.fetch_sub(1, Ordering::SeqCst);
            return Err(SubmissionError::HttpStatus(503));
        }
        if code == COLA {
            Ok(LookupOutcome::Found(cola()))
        } else {
            Ok(LookupOutcome::NotFound {
                barcode: code.to_string(),
            })
        }
    }
}

#[async_trait::async_trait]
impl OcrService for FakeBackend {
    async fn extract(&self, _image: &CapturedImage) -> Result<OcrResult, SubmissionError> {
        self.gate().await;
        self.ocr_calls.fetch_add(1, Ordering::SeqCst);
        Ok(OcrResult {
            ingredients: vec!["water".to_string(), "salt".to_string()],
            processing_millis: 420,
        })
    }
}

#[async_trait::async_trait]
impl AnalysisService for FakeBackend {
    async fn analyze(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<AnalysisRecord>, SubmissionError> {
        self.gate().await;
        self.analyses.fetch_add(1, Ordering::SeqCst);
        Ok(ingredients
            .iter()
            .map(|name| {
                let level = if name.to_lowercase().contains("sugar") {
                    SafetyLevel::Caution
                } else {
                    SafetyLevel::Safe
                };
                AnalysisRecord::new(name.to_lowercase(), level)
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl ManualProductService for FakeBackend {
    async fn add_product(
        &self,
        product: &ManualProduct,
    ) -> Result<ProductRecord, SubmissionError> {
        self.gate().await;
        self.added.fetch_add(1, Ordering::SeqCst);
        Ok(ProductRecord {
            barcode: product.barcode.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            countries: product.countries.clone(),
            ingredients: scan_core::split_ingredients(&product.ingredients_text),
            ingredients_source: Some(IngredientsSource::Text),
            ingredient_image_url: None,
            source_db: Some("Manual Entry".to_string()),
        })
    }
}

#[derive(Default)]
pub struct CollectingHistory {
    records: Mutex<Vec<HistoryRecord>>,
}

impl CollectingHistory {
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl HistorySink for CollectingHistory {
    fn record(&self, record: HistoryRecord) {
        self.records.lock().unwrap().push(record);
    }
}
