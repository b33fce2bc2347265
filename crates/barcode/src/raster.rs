use image::{GrayImage, Luma};

use crate::error::BarcodeError;

const METERS_PER_INCH: f64 = 0.0254;

/// 8-bit grayscale bitmap tagged with the resolution it was rendered for.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    image: GrayImage,
    dpi: u32,
}

impl Raster {
    pub fn new(image: GrayImage, dpi: u32) -> Self {
        Self { image, dpi }
    }

    /// White canvas of the given pixel size.
    pub fn blank(width_px: u32, height_px: u32, dpi: u32) -> Self {
        Self::new(
            GrayImage::from_pixel(width_px, height_px, Luma([255])),
            dpi,
        )
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// True when the pixel at (x, y) would print as ink.
    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] < 128
    }

    /// Physical size in millimetres at the tagged resolution.
    pub fn size_mm(&self) -> (f32, f32) {
        let per_px = 25.4 / self.dpi.max(1) as f32;
        (self.width() as f32 * per_px, self.height() as f32 * per_px)
    }

    pub(crate) fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let x_end = (x + width).min(self.image.width());
        let y_end = (y + height).min(self.image.height());
        for yy in y..y_end {
            for xx in x..x_end {
                self.image.put_pixel(xx, yy, Luma([0]));
            }
        }
    }

    /// PNG bytes with a pHYs chunk, so viewers and spoolers size the image
    /// at the intended physical dimensions.
    pub fn encode_png(&self) -> Result<Vec<u8>, BarcodeError> {
        let pixels_per_meter = (self.dpi as f64 / METERS_PER_INCH).round() as u32;
        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, self.width(), self.height());
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: pixels_per_meter,
                yppu: pixels_per_meter,
                unit: png::Unit::Meter,
            }));
            let mut writer = encoder.write_header()?;
            writer.write_image_data(self.image.as_raw())?;
            writer.finish()?;
        }
        Ok(data)
    }
}
