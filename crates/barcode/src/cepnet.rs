//! CEPNet: the carrier's postal bar code.
//!
//! Eight postal-code digits plus one check digit, five bars per digit, framed
//! by a high start bar and a high end bar: 47 bars in total.

use labelkit_address::PostalCode;

use crate::error::BarcodeError;
use crate::raster::Raster;

/// Number of bars in a complete symbol.
pub const PATTERN_LEN: usize = 1 + 9 * 5 + 1;

const CODE_LEN: usize = 8;
const QUIET_MARGIN_PX: u32 = 10;
const TOP_OFFSET_PX: u32 = 2;
const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarHeight {
    High,
    Low,
}

impl BarHeight {
    /// Letter used by the published table (`A` high, `B` low).
    pub fn as_char(self) -> char {
        match self {
            BarHeight::High => 'A',
            BarHeight::Low => 'B',
        }
    }
}

use BarHeight::{High as A, Low as B};

#[rustfmt::skip]
const DIGIT_PATTERNS: [[BarHeight; 5]; 10] = [
    [B, B, A, A, B], // 0
    [B, A, B, A, B], // 1
    [B, A, B, B, A], // 2
    [B, A, A, B, B], // 3
    [A, B, B, A, B], // 4
    [A, B, B, B, A], // 5
    [A, B, A, B, B], // 6
    [A, A, B, B, B], // 7
    [A, A, B, A, B], // 8
    [A, A, B, B, A], // 9
];

/// Check digit, bar pattern and caption helpers.
pub struct Cepnet;

impl Cepnet {
    /// Distance from the digit sum up to the next multiple of ten; 0 (never 10)
    /// when the sum already is one.
    pub fn check_digit(code: &str) -> Result<u8, BarcodeError> {
        let digits = parse_code(code)?;
        Ok(check_digit_of(&digits))
    }

    pub fn check_digit_for(code: &PostalCode) -> u8 {
        let digits: Vec<u8> = code.digits().collect();
        check_digit_of(&digits)
    }

    /// The eight digits followed by the check digit.
    pub fn with_check_digit(code: &str) -> Result<String, BarcodeError> {
        let digits = parse_code(code)?;
        Ok(format!("{}{}", code, check_digit_of(&digits)))
    }

    pub fn pattern(code: &str) -> Result<Vec<BarHeight>, BarcodeError> {
        let mut digits = parse_code(code)?;
        digits.push(check_digit_of(&digits));

        let mut pattern = Vec::with_capacity(PATTERN_LEN);
        pattern.push(BarHeight::High);
        for digit in digits {
            pattern.extend_from_slice(&DIGIT_PATTERNS[digit as usize]);
        }
        pattern.push(BarHeight::High);
        Ok(pattern)
    }

    pub fn pattern_string(code: &str) -> Result<String, BarcodeError> {
        Ok(Self::pattern(code)?
            .into_iter()
            .map(BarHeight::as_char)
            .collect())
    }

    /// Human-readable caption: `DDDDD-DDD (C)`.
    pub fn caption(code: &str) -> Result<String, BarcodeError> {
        let check = Self::check_digit(code)?;
        Ok(format!("{}-{} ({})", &code[..5], &code[5..], check))
    }
}

fn parse_code(code: &str) -> Result<Vec<u8>, BarcodeError> {
    let invalid = || BarcodeError::InvalidCodeLength {
        input: code.to_string(),
        length: code.chars().count(),
    };
    if code.len() != CODE_LEN || !code.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    Ok(code.bytes().map(|byte| byte - b'0').collect())
}

fn check_digit_of(digits: &[u8]) -> u8 {
    let sum: u32 = digits.iter().map(|&digit| digit as u32).sum();
    match sum % 10 {
        0 => 0,
        rest => (10 - rest) as u8,
    }
}

/// A rendered symbol together with its caption text. The caption is drawn by
/// the page renderer beneath the raster, not burned into it.
#[derive(Debug, Clone)]
pub struct CepnetImage {
    pub raster: Raster,
    pub caption: String,
    pub check_digit: u8,
}

/// Rasterizes CEPNet symbols for a physical box at a given resolution.
#[derive(Debug, Clone, Copy)]
pub struct CepnetRenderer {
    pub dpi: u32,
}

impl CepnetRenderer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    pub fn px(&self, mm: f32) -> u32 {
        (mm / MM_PER_INCH * self.dpi as f32).round().max(0.0) as u32
    }

    /// Renders `code` into a `width_mm` x `height_mm` raster.
    ///
    /// Each bar is followed by a gap of the same width; the bar pitch is the
    /// largest that fits between the quiet margins. High bars fill the bar
    /// area, low bars half of it, both hanging from the same top offset.
    pub fn render(
        &self,
        code: &str,
        width_mm: f32,
        height_mm: f32,
    ) -> Result<CepnetImage, BarcodeError> {
        let pattern = Cepnet::pattern(code)?;
        let width_px = self.px(width_mm);
        let height_px = self.px(height_mm);

        let usable = width_px.saturating_sub(2 * QUIET_MARGIN_PX);
        let pitch = usable / PATTERN_LEN as u32;
        if pitch < 2 {
            return Err(BarcodeError::InsufficientWidth {
                required_px: 2 * PATTERN_LEN as u32 + 2 * QUIET_MARGIN_PX,
                available_px: width_px,
            });
        }
        let bar_area = height_px.saturating_sub(2 * TOP_OFFSET_PX);
        if bar_area < 2 {
            return Err(BarcodeError::InsufficientHeight {
                required_px: 2 + 2 * TOP_OFFSET_PX,
                available_px: height_px,
            });
        }

        let bar_width = pitch / 2;
        let drawn = PATTERN_LEN as u32 * pitch - (pitch - bar_width);
        let mut x = (width_px - drawn) / 2;
        let low_height = bar_area / 2;

        let mut raster = Raster::blank(width_px, height_px, self.dpi);
        for bar in &pattern {
            let height = match bar {
                BarHeight::High => bar_area,
                BarHeight::Low => low_height,
            };
            raster.fill_rect(x, TOP_OFFSET_PX, bar_width, height);
            x += pitch;
        }

        tracing::debug!(code, width_px, height_px, pitch, "rendered CEPNet raster");

        Ok(CepnetImage {
            raster,
            caption: Cepnet::caption(code)?,
            check_digit: Cepnet::check_digit(code)?,
        })
    }
}
