use thiserror::Error;

/// Errors raised while validating address records at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("postal code {input:?} must contain exactly 8 digits, found {digits}")]
    InvalidPostalCode { input: String, digits: usize },
    #[error("required field `{0}` is empty")]
    MissingField(&'static str),
    #[error("state {0:?} must be a two-letter abbreviation")]
    InvalidState(String),
}
