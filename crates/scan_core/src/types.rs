use std::fmt;

use crate::{CapturedImage, ManualProduct};

/// Safety tier assigned per ingredient by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    Safe,
    Caution,
    Avoid,
    Unknown,
}

impl SafetyLevel {
    /// Parses the service label; anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "safe" => SafetyLevel::Safe,
            "caution" => SafetyLevel::Caution,
            "avoid" => SafetyLevel::Avoid,
            _ => SafetyLevel::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SafetyLevel::Safe => "safe",
            SafetyLevel::Caution => "caution",
            SafetyLevel::Avoid => "avoid",
            SafetyLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured result from the ingredient analysis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub name: String,
    pub safety_level: SafetyLevel,
    /// 0-100, higher is healthier.
    pub health_score: Option<u8>,
    pub concerns: Vec<String>,
    pub benefits: Vec<String>,
}

impl AnalysisRecord {
    pub fn new(name: impl Into<String>, safety_level: SafetyLevel) -> Self {
        Self {
            name: name.into(),
            safety_level,
            health_score: None,
            concerns: Vec::new(),
            benefits: Vec::new(),
        }
    }

    pub fn has_notes(&self) -> bool {
        !self.concerns.is_empty() || !self.benefits.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientsSource {
    /// Split from the product's raw ingredient text.
    Text,
    /// Taken from the product database's structured list.
    Structured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub countries: String,
    pub ingredients: Vec<String>,
    pub ingredients_source: Option<IngredientsSource>,
    pub ingredient_image_url: Option<String>,
    pub source_db: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(ProductRecord),
    NotFound { barcode: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrResult {
    pub ingredients: Vec<String>,
    pub processing_millis: u64,
}

/// A request handed to the external services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionRequest {
    Lookup { code: String },
    Ocr { image: CapturedImage },
    Analyze { ingredients: Vec<String> },
    AddProduct { product: ManualProduct },
}

impl SubmissionRequest {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            SubmissionRequest::Lookup { .. } => SubmissionKind::Lookup,
            SubmissionRequest::Ocr { .. } => SubmissionKind::Ocr,
            SubmissionRequest::Analyze { .. } => SubmissionKind::Analyze,
            SubmissionRequest::AddProduct { .. } => SubmissionKind::AddProduct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Lookup,
    Ocr,
    Analyze,
    AddProduct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Lookup(LookupOutcome),
    Ocr(OcrResult),
    Analysis(Vec<AnalysisRecord>),
    /// The service accepted a manually entered product.
    ProductAdded(ProductRecord),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("service error: {0}")]
    Service(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// The result of the last completed acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquiredResult {
    Product(ProductRecord),
    NotFound { barcode: String },
    Ocr(OcrResult),
}

impl AcquiredResult {
    pub fn ingredients(&self) -> &[String] {
        match self {
            AcquiredResult::Product(product) => &product.ingredients,
            AcquiredResult::Ocr(ocr) => &ocr.ingredients,
            AcquiredResult::NotFound { .. } => &[],
        }
    }
}

/// A completed acquisition to append to the scan history. Timestamps and ids
/// are assigned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryRecord {
    Barcode {
        code: String,
        product_name: String,
        ingredients: Vec<String>,
    },
    Ocr {
        ingredients: Vec<String>,
        processing_millis: u64,
    },
}
