use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use scan_core::{
    AnalysisRecord, CapturedImage, LookupOutcome, ManualProduct, OcrResult, ProductRecord,
    SubmissionError, SubmissionOutcome, SubmissionRequest,
};
use scan_logging::{scan_debug, scan_warn};

use crate::wire::{
    AnalyzeRequest, AnalyzeResponse, ErrorBody, ManualProductRequest, ManualProductResponse,
    OcrResponse, SearchRequest, SearchResponse,
};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait::async_trait]
pub trait LookupService: Send + Sync {
    async fn lookup(&self, code: &str) -> Result<LookupOutcome, SubmissionError>;
}

#[async_trait::async_trait]
pub trait OcrService: Send + Sync {
    async fn extract(&self, image: &CapturedImage) -> Result<OcrResult, SubmissionError>;
}

#[async_trait::async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, ingredients: &[String])
        -> Result<Vec<AnalysisRecord>, SubmissionError>;
}

/// Registers a product the database did not know.
#[async_trait::async_trait]
pub trait ManualProductService: Send + Sync {
    async fn add_product(&self, product: &ManualProduct)
        -> Result<ProductRecord, SubmissionError>;
}

/// The backend services a controller submits to.
#[derive(Clone)]
pub struct ServiceSet {
    pub lookup: Arc<dyn LookupService>,
    pub ocr: Arc<dyn OcrService>,
    pub analysis: Arc<dyn AnalysisService>,
    pub manual: Arc<dyn ManualProductService>,
}

impl ServiceSet {
    /// Uses one backend for every service.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: LookupService + OcrService + AnalysisService + ManualProductService + 'static,
    {
        Self {
            lookup: backend.clone(),
            ocr: backend.clone(),
            analysis: backend.clone(),
            manual: backend,
        }
    }

    pub async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        match request {
            SubmissionRequest::Lookup { code } => {
                self.lookup.lookup(code).await.map(SubmissionOutcome::Lookup)
            }
            SubmissionRequest::Ocr { image } => {
                self.ocr.extract(image).await.map(SubmissionOutcome::Ocr)
            }
            SubmissionRequest::Analyze { ingredients } => self
                .analysis
                .analyze(ingredients)
                .await
                .map(SubmissionOutcome::Analysis),
            SubmissionRequest::AddProduct { product } => self
                .manual
                .add_product(product)
                .await
                .map(SubmissionOutcome::ProductAdded),
        }
    }
}

/// HTTP client for the product lookup backend.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ServiceSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ServiceSettings) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SubmissionError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait::async_trait]
impl LookupService for ReqwestBackend {
    async fn lookup(&self, code: &str) -> Result<LookupOutcome, SubmissionError> {
        scan_debug!("lookup barcode={}", code);
        let response = self
            .client
            .post(self.endpoint("/api/search"))
            .json(&SearchRequest { barcode: code })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(LookupOutcome::NotFound {
                barcode: code.to_string(),
            });
        }
        let body: SearchResponse = read_json(response).await?;
        body.into_product(code).map(LookupOutcome::Found)
    }
}

#[async_trait::async_trait]
impl OcrService for ReqwestBackend {
    async fn extract(&self, image: &CapturedImage) -> Result<OcrResult, SubmissionError> {
        scan_debug!(
            "ocr file={} bytes={}",
            image.file_name,
            image.bytes.len()
        );
        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|err| SubmissionError::InvalidResponse(err.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("/api/ocr"))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body: OcrResponse = read_json(response).await?;
        body.into_result()
    }
}

#[async_trait::async_trait]
impl AnalysisService for ReqwestBackend {
    async fn analyze(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<AnalysisRecord>, SubmissionError> {
        scan_debug!("analyze {} ingredients", ingredients.len());
        let response = self
            .client
            .post(self.endpoint("/api/analyze"))
            .json(&AnalyzeRequest { ingredients })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body: AnalyzeResponse = read_json(response).await?;
        body.into_records()
    }
}

#[async_trait::async_trait]
impl ManualProductService for ReqwestBackend {
    async fn add_product(
        &self,
        product: &ManualProduct,
    ) -> Result<ProductRecord, SubmissionError> {
        scan_debug!("add product barcode={}", product.barcode);
        let response = self
            .client
            .post(self.endpoint("/api/product/manual"))
            .json(&ManualProductRequest::from(product))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body: ManualProductResponse = read_json(response).await?;
        body.into_product(&product.barcode)
    }
}

/// Decodes a successful body, or turns a failed one into the service's own
/// error message when it sent one.
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SubmissionError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        scan_warn!("backend answered {}: {:?}", status, body.error);
        return Err(match body.error {
            Some(message) => SubmissionError::Service(message),
            None => SubmissionError::HttpStatus(status.as_u16()),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|err| SubmissionError::InvalidResponse(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> SubmissionError {
    if err.is_timeout() {
        return SubmissionError::Timeout;
    }
    SubmissionError::Network(err.to_string())
}
