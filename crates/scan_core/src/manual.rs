use crate::{validate_ean13, BarcodeError};

/// A product typed in by the user after a lookup came back empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManualProduct {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub countries: String,
    /// Raw label text; the service splits it into ingredients.
    pub ingredients_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManualEntryError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid barcode: {0}")]
    InvalidBarcode(#[from] BarcodeError),
}

impl ManualProduct {
    /// Trims every field and checks the required ones.
    pub fn validated(self) -> Result<Self, ManualEntryError> {
        let entry = Self {
            barcode: self.barcode.trim().to_string(),
            name: self.name.trim().to_string(),
            brand: self.brand.trim().to_string(),
            countries: self.countries.trim().to_string(),
            ingredients_text: self.ingredients_text.trim().to_string(),
        };
        let required = [
            ("barcode", &entry.barcode),
            ("name", &entry.name),
            ("ingredients", &entry.ingredients_text),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(ManualEntryError::MissingField(*field));
        }
        validate_ean13(&entry.barcode)?;
        Ok(entry)
    }
}
