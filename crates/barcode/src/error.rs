use thiserror::Error;

#[derive(Debug, Error)]
pub enum BarcodeError {
    #[error("postal code {input:?} must be exactly 8 numeric digits (got {length} characters)")]
    InvalidCodeLength { input: String, length: usize },
    #[error("bar code needs at least {required_px}px of width, only {available_px}px available")]
    InsufficientWidth { required_px: u32, available_px: u32 },
    #[error("bar code needs at least {required_px}px of height, only {available_px}px available")]
    InsufficientHeight { required_px: u32, available_px: u32 },
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("2-D symbol encoder failed: {0}")]
    Symbol(String),
    #[error("tracking code {0:?} must look like AA123456789BR")]
    InvalidTrackingCode(String),
}
