use labelkit_address::AddressError;
use labelkit_barcode::BarcodeError;
use labelkit_settings::SettingsError;
use thiserror::Error;

/// Errors raised while generating labels.
///
/// Only the first two abort a generation call in practice; barcode failures
/// are downgraded to [`crate::LabelWarning`]s by the layout engines.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("postal code {input:?} must be exactly 8 numeric digits (got {length})")]
    InvalidCodeLength { input: String, length: usize },
    #[error("unsupported label type {0:?}")]
    UnsupportedLabelType(String),
    #[error("bar code could not be rendered: {0}")]
    BarcodeRender(#[source] BarcodeError),
    #[error("invalid address: {0}")]
    Address(#[source] AddressError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("batch contains no labels")]
    EmptyBatch,
    #[error("page {page} out of range (document has {pages})")]
    PageOutOfRange { page: usize, pages: usize },
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("preview rendering failed: {0}")]
    Preview(#[from] image::ImageError),
}

impl From<AddressError> for LabelError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::InvalidPostalCode { input, digits } => LabelError::InvalidCodeLength {
                input,
                length: digits,
            },
            other => LabelError::Address(other),
        }
    }
}

impl From<BarcodeError> for LabelError {
    fn from(err: BarcodeError) -> Self {
        match err {
            BarcodeError::InvalidCodeLength { input, length } => {
                LabelError::InvalidCodeLength { input, length }
            }
            other => LabelError::BarcodeRender(other),
        }
    }
}
