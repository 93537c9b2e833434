//! JSON bodies exchanged with the product backend.

use serde::{Deserialize, Serialize};

use scan_core::{
    split_ingredients, AnalysisRecord, IngredientsSource, ManualProduct, OcrResult, ProductRecord,
    SafetyLevel, SubmissionError,
};

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub barcode: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyzeRequest<'a> {
    pub ingredients: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct ManualProductRequest<'a> {
    pub barcode: &'a str,
    pub name: &'a str,
    pub brand: &'a str,
    pub ingredients: &'a str,
    pub countries: &'a str,
}

impl<'a> From<&'a ManualProduct> for ManualProductRequest<'a> {
    fn from(product: &'a ManualProduct) -> Self {
        Self {
            barcode: &product.barcode,
            name: &product.name,
            brand: &product.brand,
            ingredients: &product.ingredients_text,
            countries: &product.countries,
        }
    }
}

/// Error body shared by every route: `{ "success": false, "error": "..." }`.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    barcode: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    countries: Option<String>,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default)]
    ingredients_text: Option<String>,
    #[serde(default)]
    ingredients_source: Option<String>,
    #[serde(default)]
    ingredient_image_url: Option<String>,
    #[serde(default)]
    source_db: Option<String>,
}

impl SearchResponse {
    pub fn into_product(self, requested: &str) -> Result<ProductRecord, SubmissionError> {
        if !self.success {
            return Err(service_error(self.error));
        }
        let mut source = match self.ingredients_source.as_deref() {
            Some("text") => Some(IngredientsSource::Text),
            Some("structured") => Some(IngredientsSource::Structured),
            _ => None,
        };
        let mut ingredients = self.ingredients;
        if ingredients.is_empty() {
            if let Some(text) = self.ingredients_text.as_deref() {
                ingredients = split_ingredients(text);
                if !ingredients.is_empty() {
                    source = Some(IngredientsSource::Text);
                }
            }
        }
        Ok(ProductRecord {
            barcode: self.barcode.unwrap_or_else(|| requested.to_string()),
            name: or_dash(self.name),
            brand: or_dash(self.brand),
            countries: or_dash(self.countries),
            ingredients,
            ingredients_source: source,
            ingredient_image_url: self.ingredient_image_url,
            source_db: self.source_db,
        })
    }
}

/// Stored product echoed back by the manual entry route, in the product
/// database's own field names.
#[derive(Debug, Deserialize)]
pub(crate) struct ManualProductResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    product: Option<ManualProductBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManualProductBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    countries: Option<String>,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default)]
    ingredients_text: Option<String>,
}

impl ManualProductResponse {
    pub fn into_product(self, requested: &str) -> Result<ProductRecord, SubmissionError> {
        if !self.success {
            return Err(service_error(self.error));
        }
        let Some(body) = self.product else {
            return Err(SubmissionError::InvalidResponse(
                "product missing from response".to_string(),
            ));
        };
        let mut ingredients = body.ingredients;
        if ingredients.is_empty() {
            ingredients = body
                .ingredients_text
                .as_deref()
                .map(split_ingredients)
                .unwrap_or_default();
        }
        Ok(ProductRecord {
            barcode: body.code.unwrap_or_else(|| requested.to_string()),
            name: or_dash(body.product_name),
            brand: or_dash(body.brands),
            countries: or_dash(body.countries),
            ingredients,
            ingredients_source: Some(IngredientsSource::Text),
            ingredient_image_url: None,
            source_db: Some("Manual Entry".to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OcrResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default)]
    processing_time: f64,
}

impl OcrResponse {
    pub fn into_result(self) -> Result<OcrResult, SubmissionError> {
        if !self.success {
            return Err(service_error(self.error));
        }
        let seconds = if self.processing_time.is_finite() {
            self.processing_time.max(0.0)
        } else {
            0.0
        };
        Ok(OcrResult {
            ingredients: self.ingredients,
            processing_millis: (seconds * 1000.0).round() as u64,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ingredients: Vec<AnalysisRecordBody>,
}

impl AnalyzeResponse {
    pub fn into_records(self) -> Result<Vec<AnalysisRecord>, SubmissionError> {
        if !self.success {
            return Err(service_error(self.error));
        }
        Ok(self
            .ingredients
            .into_iter()
            .filter(|body| !body.name.trim().is_empty())
            .map(AnalysisRecordBody::into_record)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalysisRecordBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    safety_level: Option<String>,
    #[serde(default)]
    health_score: Option<f64>,
    #[serde(default)]
    concerns: Vec<String>,
    #[serde(default)]
    benefits: Vec<String>,
}

impl AnalysisRecordBody {
    fn into_record(self) -> AnalysisRecord {
        AnalysisRecord {
            name: self.name,
            safety_level: self
                .safety_level
                .as_deref()
                .map_or(SafetyLevel::Unknown, SafetyLevel::from_label),
            health_score: self
                .health_score
                .filter(|score| score.is_finite())
                .map(|score| score.round().clamp(0.0, 100.0) as u8),
            concerns: self.concerns,
            benefits: self.benefits,
        }
    }
}

fn or_dash(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "-".to_string())
}

fn service_error(message: Option<String>) -> SubmissionError {
    SubmissionError::Service(message.unwrap_or_else(|| "request was not successful".to_string()))
}
