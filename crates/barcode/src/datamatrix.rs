//! Content string for the carrier's Data Matrix symbol.
//!
//! Only the payload is produced here. Module placement and error correction
//! belong to an external encoder plugged in through [`MatrixSymbolEncoder`].
//!
//! Field table (widths in characters, 170 in total):
//!
//! ```text
//!  #  field                    width  pad        truncation
//!  1  destination CEP             8   -          -
//!  2  destination complement      5   left '0'   first 5 digits kept
//!  3  origin CEP                  8   -          -
//!  4  origin complement           5   left '0'   first 5 digits kept
//!  5  destination check digit     1   -          -
//!  6  service type (IDV)          2   left '0'   first 2 kept
//!  7  service content (CIF)      34   right '0'  first 34 kept
//!  8  additional services        10   right '0'  first 10 kept
//!  9  principal service           5   right '0'  first 5 kept
//! 10  reserved                   15   zeros      -
//! 11  classification (CNAE)       9   right '0'  digits only, first 9 kept
//! 12  tracking code              13   right ' '  first 13 kept
//! 13  free field                 54   right ' '  first 54 kept
//! 14  terminator                  1   '|'        -
//! ```

use std::collections::BTreeSet;

use image::GrayImage;
use labelkit_address::PostalCode;

use crate::cepnet::Cepnet;
use crate::error::BarcodeError;

pub const PAYLOAD_LEN: usize = 170;

const COMPLEMENT_WIDTH: usize = 5;
const SERVICE_TYPE_WIDTH: usize = 2;
const SERVICE_CONTENT_WIDTH: usize = 34;
const ADDITIONAL_SERVICES_WIDTH: usize = 10;
const PRINCIPAL_SERVICE_WIDTH: usize = 5;
const RESERVED_WIDTH: usize = 15;
const CLASSIFICATION_WIDTH: usize = 9;
const TRACKING_WIDTH: usize = 13;
const FREE_FIELD_WIDTH: usize = 54;
const TERMINATOR: char = '|';

const NO_NUMBER_MARKERS: [&str; 3] = ["SN", "S/N", "S.N."];

/// Service type (IDV) of the mail piece.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServiceType {
    FacSimples,
    #[default]
    CartaSimples,
    ECartaSimples,
    FacRegistrado,
    CartaRegistrada,
    CartaViaInternet,
    ECartaRegistrado,
    /// Raw code for services without a named variant.
    Code(String),
}

impl ServiceType {
    pub fn code(&self) -> &str {
        match self {
            ServiceType::FacSimples => "01",
            ServiceType::CartaSimples => "03",
            ServiceType::ECartaSimples => "04",
            ServiceType::FacRegistrado => "16",
            ServiceType::CartaRegistrada => "17",
            ServiceType::CartaViaInternet => "27",
            ServiceType::ECartaRegistrado => "28",
            ServiceType::Code(code) => code,
        }
    }

    /// Accepts the upper-snake names (`CARTA_SIMPLES`) or a numeric code.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_uppercase().as_str() {
            "FAC_SIMPLES" | "01" => ServiceType::FacSimples,
            "CARTA_SIMPLES" | "03" => ServiceType::CartaSimples,
            "E_CARTA_SIMPLES" | "04" => ServiceType::ECartaSimples,
            "FAC_REGISTRADO" | "16" => ServiceType::FacRegistrado,
            "CARTA_REGISTRADA" | "17" => ServiceType::CartaRegistrada,
            "CARTA_VIA_INTERNET" | "27" => ServiceType::CartaViaInternet,
            "E_CARTA_REGISTRADO" | "28" => ServiceType::ECartaRegistrado,
            _ => ServiceType::Code(input.trim().to_string()),
        }
    }
}

/// Additional services. Ordering follows the 3-digit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdditionalService {
    /// AR, aviso de recebimento.
    DeliveryReceipt,
    /// MP, mao propria.
    OwnHands,
    /// VD, valor declarado.
    DeclaredValue,
    /// DD, devolucao de documentos.
    DocumentReturn,
}

impl AdditionalService {
    pub fn code(self) -> &'static str {
        match self {
            AdditionalService::DeliveryReceipt => "001",
            AdditionalService::OwnHands => "002",
            AdditionalService::DeclaredValue => "003",
            AdditionalService::DocumentReturn => "004",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        match mnemonic.trim().to_ascii_uppercase().as_str() {
            "AR" => Some(AdditionalService::DeliveryReceipt),
            "MP" => Some(AdditionalService::OwnHands),
            "VD" => Some(AdditionalService::DeclaredValue),
            "DD" => Some(AdditionalService::DocumentReturn),
            _ => None,
        }
    }

    /// Parses a list of mnemonics, silently skipping unknown ones.
    pub fn parse_list<'a>(mnemonics: impl IntoIterator<Item = &'a str>) -> BTreeSet<Self> {
        mnemonics
            .into_iter()
            .filter_map(Self::from_mnemonic)
            .collect()
    }
}

/// Inputs for one payload.
#[derive(Debug, Clone)]
pub struct PayloadFields {
    pub destination: PostalCode,
    pub destination_number: String,
    pub origin: PostalCode,
    pub origin_number: String,
    pub service_type: ServiceType,
    pub service_content: String,
    pub additional_services: BTreeSet<AdditionalService>,
    pub principal_service: String,
    pub classification: String,
    pub tracking_code: String,
    pub free_text: String,
}

impl PayloadFields {
    /// Fields with only the two addresses filled in and defaults elsewhere.
    pub fn new(
        destination: PostalCode,
        destination_number: impl Into<String>,
        origin: PostalCode,
        origin_number: impl Into<String>,
    ) -> Self {
        Self {
            destination,
            destination_number: destination_number.into(),
            origin,
            origin_number: origin_number.into(),
            service_type: ServiceType::default(),
            service_content: String::new(),
            additional_services: BTreeSet::new(),
            principal_service: String::new(),
            classification: String::new(),
            tracking_code: String::new(),
            free_text: String::new(),
        }
    }

    /// Packs the fields into the fixed-width content string.
    pub fn pack(&self) -> PackedPayload {
        let mut packer = Packer::default();

        packer.raw(self.destination.as_str());
        packer.complement("destination_complement", &self.destination_number);
        packer.raw(self.origin.as_str());
        packer.complement("origin_complement", &self.origin_number);
        packer.raw(&Cepnet::check_digit_for(&self.destination).to_string());
        packer.left_padded(
            "service_type",
            self.service_type.code(),
            SERVICE_TYPE_WIDTH,
            '0',
        );
        packer.right_padded(
            "service_content",
            &self.service_content,
            SERVICE_CONTENT_WIDTH,
            '0',
        );
        let services: String = self
            .additional_services
            .iter()
            .map(|service| service.code())
            .collect();
        packer.right_padded(
            "additional_services",
            &services,
            ADDITIONAL_SERVICES_WIDTH,
            '0',
        );
        packer.right_padded(
            "principal_service",
            &self.principal_service,
            PRINCIPAL_SERVICE_WIDTH,
            '0',
        );
        packer.raw(&"0".repeat(RESERVED_WIDTH));
        let classification: String = self
            .classification
            .chars()
            .filter(|ch| ch.is_ascii_digit())
            .collect();
        packer.right_padded(
            "classification",
            &classification,
            CLASSIFICATION_WIDTH,
            '0',
        );
        packer.right_padded("tracking_code", &self.tracking_code, TRACKING_WIDTH, ' ');
        packer.right_padded("free_text", &self.free_text, FREE_FIELD_WIDTH, ' ');
        packer.content.push(TERMINATOR);

        if !packer.truncated.is_empty() {
            tracing::debug!(fields = ?packer.truncated, "payload fields truncated to width");
        }

        PackedPayload {
            content: packer.content,
            truncated: packer.truncated,
        }
    }
}

/// Packed content plus the names of fields whose input was cut to fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPayload {
    pub content: String,
    pub truncated: Vec<&'static str>,
}

impl PackedPayload {
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Default)]
struct Packer {
    content: String,
    truncated: Vec<&'static str>,
}

impl Packer {
    fn raw(&mut self, value: &str) {
        self.content.push_str(value);
    }

    fn fit(&mut self, field: &'static str, value: &str, width: usize) -> (String, usize) {
        let count = value.chars().count();
        if count > width {
            self.truncated.push(field);
        }
        let kept: String = value.chars().take(width).collect();
        let pad = width - count.min(width);
        (kept, pad)
    }

    fn left_padded(&mut self, field: &'static str, value: &str, width: usize, pad: char) {
        let (kept, missing) = self.fit(field, value, width);
        self.content.extend(std::iter::repeat(pad).take(missing));
        self.content.push_str(&kept);
    }

    fn right_padded(&mut self, field: &'static str, value: &str, width: usize, pad: char) {
        let (kept, missing) = self.fit(field, value, width);
        self.content.push_str(&kept);
        self.content.extend(std::iter::repeat(pad).take(missing));
    }

    /// Building number as a 5-digit CEP complement; `00000` without a number.
    fn complement(&mut self, field: &'static str, number: &str) {
        let trimmed = number.trim();
        let no_number = trimmed.is_empty()
            || NO_NUMBER_MARKERS
                .iter()
                .any(|marker| trimmed.eq_ignore_ascii_case(marker));
        if no_number {
            self.raw(&"0".repeat(COMPLEMENT_WIDTH));
            return;
        }
        let digits: String = trimmed.chars().filter(|ch| ch.is_ascii_digit()).collect();
        self.left_padded(field, &digits, COMPLEMENT_WIDTH, '0');
    }
}

/// Seam to an external 2-D matrix encoder.
pub trait MatrixSymbolEncoder: Send + Sync {
    /// Encodes `payload` into a square symbol bitmap (dark modules < 128).
    fn encode(&self, payload: &str) -> Result<GrayImage, BarcodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> PayloadFields {
        PayloadFields::new(
            PostalCode::parse("71010-050").unwrap(),
            "120",
            PostalCode::parse("01310-100").unwrap(),
            "s/n",
        )
    }

    #[test]
    fn default_payload_has_fixed_length_and_layout() {
        let payload = fields().pack();
        let content = &payload.content;
        assert_eq!(payload.len(), PAYLOAD_LEN);
        assert!(payload.truncated.is_empty());

        assert_eq!(&content[0..8], "71010050");
        assert_eq!(&content[8..13], "00120");
        assert_eq!(&content[13..21], "01310100");
        assert_eq!(&content[21..26], "00000");
        assert_eq!(&content[26..27], "6");
        assert_eq!(&content[27..29], "03");
        assert_eq!(&content[29..63], "0".repeat(34));
        assert_eq!(&content[63..73], "0000000000");
        assert_eq!(&content[73..78], "00000");
        assert_eq!(&content[78..93], "0".repeat(15));
        assert_eq!(&content[93..102], "000000000");
        assert_eq!(&content[102..115], " ".repeat(13));
        assert_eq!(&content[115..169], " ".repeat(54));
        assert!(content.ends_with('|'));
    }

    #[test]
    fn additional_services_are_sorted_and_zero_filled() {
        let mut fields = fields();
        fields.additional_services = AdditionalService::parse_list(["vd", "AR", "xx"]);
        let content = fields.pack().content;
        assert_eq!(&content[63..73], "0010030000");
    }

    #[test]
    fn four_services_are_cut_to_field_width() {
        let mut fields = fields();
        fields.additional_services = AdditionalService::parse_list(["DD", "VD", "MP", "AR"]);
        let payload = fields.pack();
        assert_eq!(&payload.content[63..73], "0010020030");
        assert_eq!(payload.truncated, vec!["additional_services"]);
        assert_eq!(payload.len(), PAYLOAD_LEN);
    }

    #[test]
    fn overflowing_inputs_are_truncated_silently() {
        let mut fields = fields();
        fields.destination_number = "1234567".into();
        fields.service_content = "X".repeat(40);
        fields.tracking_code = "JC123456789BRXX".into();
        fields.free_text = "pedido ".repeat(10);
        let payload = fields.pack();
        assert_eq!(payload.len(), PAYLOAD_LEN);
        assert_eq!(&payload.content[8..13], "12345");
        assert_eq!(&payload.content[102..115], "JC123456789BR");
        assert_eq!(
            payload.truncated,
            vec![
                "destination_complement",
                "service_content",
                "tracking_code",
                "free_text"
            ]
        );
    }

    #[test]
    fn complement_markers_map_to_zeros() {
        for marker in ["", "SN", "s/n", "S.N."] {
            let mut fields = fields();
            fields.destination_number = marker.into();
            assert_eq!(&fields.pack().content[8..13], "00000", "marker {marker:?}");
        }
        let mut fields = fields();
        fields.destination_number = "12-B".into();
        assert_eq!(&fields.pack().content[8..13], "00012");
    }

    #[test]
    fn service_type_codes_are_left_padded() {
        let mut fields = fields();
        fields.service_type = ServiceType::parse("carta_registrada");
        assert_eq!(&fields.pack().content[27..29], "17");
        fields.service_type = ServiceType::Code("7".into());
        assert_eq!(&fields.pack().content[27..29], "07");
    }

    #[test]
    fn classification_keeps_digits_only() {
        let mut fields = fields();
        fields.classification = "4751-2/01".into();
        assert_eq!(&fields.pack().content[93..102], "475120100");
    }

    #[test]
    fn free_text_counts_characters() {
        let mut fields = fields();
        fields.free_text = "Pedido nº 42 – São Paulo".into();
        let payload = fields.pack();
        assert_eq!(payload.len(), PAYLOAD_LEN);
        assert!(payload.content.ends_with('|'));
    }
}
