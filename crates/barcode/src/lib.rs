//! Postal machine-readable codes: the CEPNet linear bar code and the content
//! string for the carrier's Data Matrix symbol.

pub mod cepnet;
pub mod datamatrix;
pub mod error;
pub mod raster;
pub mod tracking;

pub use cepnet::{BarHeight, Cepnet, CepnetImage, CepnetRenderer, PATTERN_LEN};
pub use datamatrix::{
    AdditionalService, MatrixSymbolEncoder, PackedPayload, PayloadFields, ServiceType,
    PAYLOAD_LEN,
};
pub use error::BarcodeError;
pub use raster::Raster;
pub use tracking::TrackingCode;
