#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BarcodeError {
    #[error("EAN-13 must be exactly 13 digits (got {0})")]
    WrongLength(usize),
    #[error("EAN-13 must contain only digits")]
    NonDigit,
    #[error("invalid checksum (expected {expected}, got {found})")]
    Checksum { expected: u32, found: u32 },
}

/// Validates an EAN-13 code: 13 ASCII digits with a matching check digit.
pub fn validate_ean13(code: &str) -> Result<(), BarcodeError> {
    let len = code.chars().count();
    if len != 13 {
        return Err(BarcodeError::WrongLength(len));
    }
    let digits = code
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<u32>>>()
        .ok_or(BarcodeError::NonDigit)?;

    // Weights alternate 1, 3, 1, ... over the first twelve digits.
    let total: u32 = digits[..12]
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { 3 * d })
        .sum();
    let expected = (10 - total % 10) % 10;
    let found = digits[12];
    if expected != found {
        return Err(BarcodeError::Checksum { expected, found });
    }
    Ok(())
}
