use std::fmt;
use std::str::FromStr;

use crate::error::LabelError;

const MM_PER_INCH: f32 = 25.4;
const PT_PER_INCH: f32 = 72.0;

/// Millimetres to PDF points.
pub fn mm(value: f32) -> f32 {
    value / MM_PER_INCH * PT_PER_INCH
}

/// Physical media size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PaperSize {
    pub const A4: PaperSize = PaperSize::new(210.0, 297.0);

    pub const fn new(width_mm: f32, height_mm: f32) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    pub fn to_points(&self) -> (f32, f32) {
        (mm(self.width_mm), mm(self.height_mm))
    }
}

/// Grid of identical cells on a multi-up sheet. All lengths in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub columns: usize,
    pub rows: usize,
    pub margin_top: f32,
    pub margin_left: f32,
    pub spacing_h: f32,
    pub spacing_v: f32,
}

impl GridSpec {
    pub fn per_page(&self) -> usize {
        self.rows * self.columns
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatKind {
    /// One label per page, page sized to the label.
    Thermal,
    /// Labels of the format's `size` in a grid on `sheet` paper.
    MultiUp { sheet: PaperSize, grid: GridSpec },
    /// Area-based envelope layout, page sized to the envelope.
    Envelope,
}

/// A catalog entry. `size` is the label (or cell) size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelFormat {
    pub id: LabelFormatId,
    pub size: PaperSize,
    pub kind: FormatKind,
}

impl LabelFormat {
    /// Size of each physical page of the output.
    pub fn page_size(&self) -> PaperSize {
        match self.kind {
            FormatKind::MultiUp { sheet, .. } => sheet,
            FormatKind::Thermal | FormatKind::Envelope => self.size,
        }
    }

    pub fn labels_per_page(&self) -> usize {
        match self.kind {
            FormatKind::MultiUp { grid, .. } => grid.per_page(),
            FormatKind::Thermal | FormatKind::Envelope => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelFormatId {
    ThermalSmall,
    ThermalLarge,
    MultiUp6,
    MultiUp14,
    EnvelopeSmall,
    EnvelopeLarge,
}

impl LabelFormatId {
    pub const ALL: [LabelFormatId; 6] = [
        LabelFormatId::ThermalSmall,
        LabelFormatId::ThermalLarge,
        LabelFormatId::MultiUp6,
        LabelFormatId::MultiUp14,
        LabelFormatId::EnvelopeSmall,
        LabelFormatId::EnvelopeLarge,
    ];

    /// The whole catalog, in listing order.
    pub fn all() -> impl Iterator<Item = LabelFormatId> {
        Self::ALL.into_iter()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LabelFormatId::ThermalSmall => "thermal-small",
            LabelFormatId::ThermalLarge => "thermal-large",
            LabelFormatId::MultiUp6 => "multi-up-6",
            LabelFormatId::MultiUp14 => "multi-up-14",
            LabelFormatId::EnvelopeSmall => "envelope-small",
            LabelFormatId::EnvelopeLarge => "envelope-large",
        }
    }

    /// Legacy identifier accepted as an alias.
    pub fn alias(self) -> &'static str {
        match self {
            LabelFormatId::ThermalSmall => "thermal_60x30",
            LabelFormatId::ThermalLarge => "thermal_100x80",
            LabelFormatId::MultiUp6 => "pimaco_6",
            LabelFormatId::MultiUp14 => "pimaco_a4",
            LabelFormatId::EnvelopeSmall => "envelope_dl",
            LabelFormatId::EnvelopeLarge => "envelope_c5",
        }
    }

    pub fn parse(input: &str) -> Result<Self, LabelError> {
        let wanted = input.trim();
        Self::all()
            .find(|id| id.as_str() == wanted || id.alias() == wanted)
            .ok_or_else(|| LabelError::UnsupportedLabelType(input.to_string()))
    }

    pub fn format(self) -> LabelFormat {
        let (size, kind) = match self {
            LabelFormatId::ThermalSmall => (PaperSize::new(60.0, 30.0), FormatKind::Thermal),
            LabelFormatId::ThermalLarge => (PaperSize::new(100.0, 80.0), FormatKind::Thermal),
            LabelFormatId::MultiUp6 => (
                PaperSize::new(101.6, 84.7),
                FormatKind::MultiUp {
                    sheet: PaperSize::A4,
                    grid: GridSpec {
                        columns: 2,
                        rows: 3,
                        margin_top: 21.2,
                        margin_left: 3.9,
                        spacing_h: 0.0,
                        spacing_v: 0.0,
                    },
                },
            ),
            LabelFormatId::MultiUp14 => (
                PaperSize::new(99.0, 38.1),
                FormatKind::MultiUp {
                    sheet: PaperSize::A4,
                    grid: GridSpec {
                        columns: 2,
                        rows: 7,
                        margin_top: 12.7,
                        margin_left: 6.35,
                        spacing_h: 3.0,
                        spacing_v: 0.0,
                    },
                },
            ),
            LabelFormatId::EnvelopeSmall => (PaperSize::new(220.0, 110.0), FormatKind::Envelope),
            LabelFormatId::EnvelopeLarge => (PaperSize::new(229.0, 162.0), FormatKind::Envelope),
        };
        LabelFormat {
            id: self,
            size,
            kind,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LabelFormatId::ThermalSmall => "thermal label 60x30 mm",
            LabelFormatId::ThermalLarge => "thermal label 100x80 mm",
            LabelFormatId::MultiUp6 => "A4 sheet, 6 labels of 101.6x84.7 mm",
            LabelFormatId::MultiUp14 => "A4 sheet, 14 labels of 99.0x38.1 mm",
            LabelFormatId::EnvelopeSmall => "DL envelope 220x110 mm",
            LabelFormatId::EnvelopeLarge => "C5 envelope 229x162 mm",
        }
    }
}

impl fmt::Display for LabelFormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelFormatId {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_and_aliases() {
        assert_eq!(
            LabelFormatId::parse("thermal-small").unwrap(),
            LabelFormatId::ThermalSmall
        );
        assert_eq!(
            "pimaco_a4".parse::<LabelFormatId>().unwrap(),
            LabelFormatId::MultiUp14
        );
        assert_eq!(
            LabelFormatId::parse(" envelope_c5 ").unwrap(),
            LabelFormatId::EnvelopeLarge
        );
    }

    #[test]
    fn unknown_id_is_unsupported() {
        match LabelFormatId::parse("a5-sheet") {
            Err(LabelError::UnsupportedLabelType(id)) => assert_eq!(id, "a5-sheet"),
            other => panic!("expected UnsupportedLabelType, got {other:?}"),
        }
    }

    #[test]
    fn multi_up_pages_are_a4() {
        let format = LabelFormatId::MultiUp14.format();
        assert_eq!(format.page_size(), PaperSize::A4);
        assert_eq!(format.labels_per_page(), 14);
        let (w, h) = format.page_size().to_points();
        assert!((w - 595.2756).abs() < 1e-2);
        assert!((h - 841.8898).abs() < 1e-2);
    }

    #[test]
    fn single_canvas_formats_use_own_size() {
        let format = LabelFormatId::EnvelopeSmall.format();
        assert_eq!(format.page_size(), PaperSize::new(220.0, 110.0));
        assert_eq!(format.labels_per_page(), 1);
    }
}
