//! Machine-readable marks placed on a label: the CEPNet bar code with its
//! caption and the optional 2-D symbol.

use std::sync::Arc;

use labelkit_address::{Address, PostalCode, Sender};
use labelkit_barcode::{
    AdditionalService, CepnetRenderer, MatrixSymbolEncoder, PackedPayload, PayloadFields, Raster,
    ServiceType, TrackingCode,
};
use labelkit_settings::DataMatrixDefaults;

use crate::display::{
    DisplayCommand, FontWeight, ImagePlacement, Point, Size, TextAnchor, TextRun,
};
use crate::error::LabelError;

const CAPTION_SIZE_PT: f32 = 6.0;
const CAPTION_BAND_PT: f32 = CAPTION_SIZE_PT + 1.5;
const CAPTION_BASELINE_PT: f32 = 1.5;
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Axis-aligned box in points, origin at its bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub origin: Point,
    pub size: Size,
}

impl Slot {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }
}

/// Renders the bar code for `code` into `slot`. With `caption`, the bottom
/// band of the slot carries `DDDDD-DDD (C)` centered under the bars.
pub fn cepnet_fragment(
    renderer: &CepnetRenderer,
    code: &PostalCode,
    slot: Slot,
    caption: bool,
) -> Result<Vec<DisplayCommand>, LabelError> {
    let band = if caption { CAPTION_BAND_PT } else { 0.0 };
    let bars_height = slot.size.height - band;
    let symbol = renderer.render(
        code.as_str(),
        slot.size.width / PT_PER_MM,
        bars_height.max(0.0) / PT_PER_MM,
    )?;

    let mut commands = vec![DisplayCommand::Image(ImagePlacement {
        origin: Point {
            x: slot.origin.x,
            y: slot.origin.y + band,
        },
        size: Size {
            width: slot.size.width,
            height: bars_height,
        },
        raster: Arc::new(symbol.raster),
    })];
    if caption {
        commands.push(DisplayCommand::Text(
            TextRun::new(
                symbol.caption,
                FontWeight::Regular,
                CAPTION_SIZE_PT,
                slot.origin.x + slot.size.width / 2.0,
                slot.origin.y + CAPTION_BASELINE_PT,
            )
            .anchored(TextAnchor::Middle),
        ));
    }
    Ok(commands)
}

/// Content for the 2-D symbol of one label. The sender supplies the origin
/// fields; everything not tied to an address comes from `defaults`.
///
/// A well-formed tracking code is normalized (`jt 123 456 789 br` becomes
/// `JT123456789BR`); anything else is packed as given.
pub fn payload_for(
    destination: &Address,
    sender: &Sender,
    defaults: &DataMatrixDefaults,
    tracking_code: Option<&str>,
) -> PackedPayload {
    let mut fields = PayloadFields::new(
        destination.postal_code.clone(),
        destination.number.clone(),
        sender.postal_code.clone(),
        sender.number.clone(),
    );
    fields.service_type = ServiceType::parse(&defaults.service_type);
    fields.service_content = defaults.cif.clone();
    fields.additional_services =
        AdditionalService::parse_list(defaults.additional_services.iter().map(String::as_str));
    fields.principal_service = defaults.principal_service.clone();
    fields.classification = defaults.cnae.clone();
    fields.tracking_code = tracking_code
        .map(|raw| match TrackingCode::parse(raw) {
            Ok(code) => code.to_string(),
            Err(_) => raw.to_string(),
        })
        .unwrap_or_default();
    fields.pack()
}

/// Encodes `payload` with the external encoder and fits the symbol into
/// `slot`, preserving its aspect ratio.
pub fn matrix_fragment(
    encoder: &dyn MatrixSymbolEncoder,
    payload: &PackedPayload,
    slot: Slot,
    dpi: u32,
) -> Result<Vec<DisplayCommand>, LabelError> {
    let image = encoder.encode(&payload.content)?;
    let raster = Raster::new(image, dpi);
    let placed = fit_into(slot, raster.width(), raster.height());
    Ok(vec![DisplayCommand::Image(ImagePlacement {
        origin: placed.origin,
        size: placed.size,
        raster: Arc::new(raster),
    })])
}

/// Largest box with the aspect ratio of a `width_px` x `height_px` image that
/// fits in `slot`, centered.
pub fn fit_into(slot: Slot, width_px: u32, height_px: u32) -> Slot {
    if width_px == 0 || height_px == 0 {
        return Slot::new(slot.origin.x, slot.origin.y, 0.0, 0.0);
    }
    let scale = (slot.size.width / width_px as f32).min(slot.size.height / height_px as f32);
    let width = width_px as f32 * scale;
    let height = height_px as f32 * scale;
    Slot::new(
        slot.origin.x + (slot.size.width - width) / 2.0,
        slot.origin.y + (slot.size.height - height) / 2.0,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use labelkit_address::{AddressRecord, SenderRecord};
    use labelkit_barcode::BarcodeError;

    struct SquareEncoder;

    impl MatrixSymbolEncoder for SquareEncoder {
        fn encode(&self, payload: &str) -> Result<GrayImage, BarcodeError> {
            assert_eq!(payload.chars().count(), labelkit_barcode::PAYLOAD_LEN);
            Ok(GrayImage::from_pixel(24, 24, Luma([0])))
        }
    }

    fn code() -> PostalCode {
        PostalCode::parse("71010050").unwrap()
    }

    #[test]
    fn bar_code_leaves_room_for_caption() {
        let renderer = CepnetRenderer::new(300);
        let slot = Slot::new(10.0, 20.0, 45.0 * PT_PER_MM, 8.0 * PT_PER_MM);
        let commands = cepnet_fragment(&renderer, &code(), slot, true).unwrap();
        assert_eq!(commands.len(), 2);
        match &commands[0] {
            DisplayCommand::Image(image) => {
                assert_eq!(image.origin.y, 20.0 + CAPTION_BAND_PT);
                assert!((image.size.height + CAPTION_BAND_PT - slot.size.height).abs() < 1e-4);
            }
            other => panic!("expected image, got {other:?}"),
        }
        match &commands[1] {
            DisplayCommand::Text(run) => {
                assert_eq!(run.text, "71010-050 (6)");
                assert_eq!(run.anchor, TextAnchor::Middle);
            }
            other => panic!("expected caption, got {other:?}"),
        }
    }

    #[test]
    fn bar_code_failure_is_reported_not_panicked() {
        let renderer = CepnetRenderer::new(40);
        let slot = Slot::new(0.0, 0.0, 20.0 * PT_PER_MM, 10.0 * PT_PER_MM);
        let err = cepnet_fragment(&renderer, &code(), slot, false).unwrap_err();
        assert!(matches!(err, LabelError::BarcodeRender(_)));
    }

    #[test]
    fn fit_keeps_square_symbols_square() {
        let placed = fit_into(Slot::new(0.0, 0.0, 100.0, 50.0), 10, 10);
        assert_eq!(placed.size.width, 50.0);
        assert_eq!(placed.size.height, 50.0);
        assert_eq!(placed.origin.x, 25.0);
    }

    fn destination() -> Address {
        Address::try_from(AddressRecord {
            recipient: None,
            street: "Rua A".into(),
            number: "42".into(),
            complement: None,
            district: "Centro".into(),
            city: "Brasilia".into(),
            state: "DF".into(),
            cep: "71010-050".into(),
        })
        .unwrap()
    }

    fn sender() -> Sender {
        Sender::try_from(SenderRecord {
            name: "Acme".into(),
            street: "Rua B".into(),
            number: "7".into(),
            complement: None,
            district: "Se".into(),
            city: "Sao Paulo".into(),
            state: "SP".into(),
            cep: "01001-000".into(),
        })
        .unwrap()
    }

    #[test]
    fn payload_uses_sender_as_origin_and_config_defaults() {
        let destination = destination();
        let sender = sender();
        let defaults = DataMatrixDefaults {
            service_type: "CARTA_REGISTRADA".into(),
            additional_services: vec!["AR".into()],
            ..Default::default()
        };
        let payload = payload_for(&destination, &sender, &defaults, Some("JC123456789BR"));
        assert_eq!(&payload.content[..13], "7101005000042");
        assert_eq!(&payload.content[13..26], "0100100000007");
        assert_eq!(&payload.content[27..29], "17");
        assert_eq!(&payload.content[63..66], "001");
        assert_eq!(&payload.content[102..115], "JC123456789BR");

        let commands =
            matrix_fragment(&SquareEncoder, &payload, Slot::new(0.0, 0.0, 50.0, 50.0), 300)
                .unwrap();
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn tracking_code_is_normalized_before_packing() {
        let defaults = DataMatrixDefaults::default();
        let payload = payload_for(&destination(), &sender(), &defaults, Some("jt 123 456 789 br"));
        assert_eq!(&payload.content[102..115], "JT123456789BR");
        assert!(payload.truncated.is_empty());
    }

    #[test]
    fn malformed_tracking_code_is_packed_as_given() {
        let defaults = DataMatrixDefaults::default();
        let payload = payload_for(&destination(), &sender(), &defaults, Some("PEDIDO-42"));
        assert_eq!(&payload.content[102..115], "PEDIDO-42    ");
    }
}
