use image::{codecs::png::PngEncoder, ColorType, ImageBuffer, ImageEncoder, Rgba};

use crate::display::{
    Color, DisplayCommand, ImagePlacement, Point, Stroke, TextAnchor, TextRun,
};
use crate::error::LabelError;
use crate::font_metrics::text_width;
use crate::layout::PageLayout;

type Canvas = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Rendered preview bitmap for a single page.
#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: u32,
    pub data: Vec<u8>,
}

/// Rasterizes one page for on-screen preview. Text is drawn as grey bars
/// spanning each run's metric width; rules, boxes and rasters are exact.
pub fn render_preview_png(page: &PageLayout, dpi: u32) -> Result<PreviewEntry, LabelError> {
    let dpi = dpi.max(36);
    let scale = dpi as f32 / 72.0;
    let width_px = (page.size.width * scale).ceil().max(1.0) as u32;
    let height_px = (page.size.height * scale).ceil().max(1.0) as u32;
    let mut canvas = Canvas::from_pixel(width_px, height_px, Rgba([255, 255, 255, 255]));
    let to_px = |point: Point| -> (i32, i32) {
        (
            (point.x * scale).round() as i32,
            height_px as i32 - (point.y * scale).round() as i32,
        )
    };

    for command in &page.display_list.commands {
        match command {
            DisplayCommand::Text(run) => draw_text_bar(&mut canvas, run, scale, to_px),
            DisplayCommand::Rect(rect) => {
                let (x0, y1) = to_px(rect.origin);
                let (x1, y0) = to_px(Point {
                    x: rect.origin.x + rect.size.width,
                    y: rect.origin.y + rect.size.height,
                });
                let dash = rect
                    .dash
                    .map(|dash| ((dash.on * scale).max(1.0) as i32, (dash.off * scale).max(1.0) as i32));
                draw_hline(&mut canvas, x0, x1, y0, rect.stroke, dash);
                draw_hline(&mut canvas, x0, x1, y1, rect.stroke, dash);
                draw_vline(&mut canvas, x0, y0, y1, rect.stroke, dash);
                draw_vline(&mut canvas, x1, y0, y1, rect.stroke, dash);
            }
            DisplayCommand::Line { start, end, stroke } => {
                let (x0, y0) = to_px(*start);
                let (x1, y1) = to_px(*end);
                if y0 == y1 {
                    draw_hline(&mut canvas, x0, x1, y0, *stroke, None);
                } else if x0 == x1 {
                    draw_vline(&mut canvas, x0, y0, y1, *stroke, None);
                }
            }
            DisplayCommand::Image(image) => blit(&mut canvas, image, to_px),
        }
    }

    let mut data = Vec::new();
    PngEncoder::new(&mut data).write_image(canvas.as_raw(), width_px, height_px, ColorType::Rgba8)?;

    Ok(PreviewEntry {
        width_px,
        height_px,
        dpi,
        data,
    })
}

fn draw_text_bar(
    canvas: &mut Canvas,
    run: &TextRun,
    scale: f32,
    to_px: impl Fn(Point) -> (i32, i32),
) {
    let width = text_width(&run.text, run.weight, run.font_size_pt);
    let left = match run.anchor {
        TextAnchor::Start => run.position.x,
        TextAnchor::Middle => run.position.x - width / 2.0,
        TextAnchor::End => run.position.x - width,
    };
    // cap height of Helvetica is roughly 0.72 em
    let (x, baseline) = to_px(Point {
        x: left,
        y: run.position.y,
    });
    let w = (width * scale).ceil() as i32;
    let h = (run.font_size_pt * 0.72 * scale).ceil() as i32;
    let grey = Color::new(
        0.35 + run.color.r * 0.65,
        0.35 + run.color.g * 0.65,
        0.35 + run.color.b * 0.65,
        1.0,
    );
    fill_rect(canvas, x, baseline - h, w.max(1), h.max(1), grey);
}

fn blit(canvas: &mut Canvas, image: &ImagePlacement, to_px: impl Fn(Point) -> (i32, i32)) {
    let (x0, y1) = to_px(image.origin);
    let (x1, y0) = to_px(Point {
        x: image.origin.x + image.size.width,
        y: image.origin.y + image.size.height,
    });
    let (dest_w, dest_h) = (x1 - x0, y1 - y0);
    let raster = &image.raster;
    if dest_w <= 0 || dest_h <= 0 || raster.width() == 0 || raster.height() == 0 {
        return;
    }
    let black = color_to_rgba(Color::BLACK);
    for dy in 0..dest_h {
        let py = y0 + dy;
        if py < 0 || py >= canvas.height() as i32 {
            continue;
        }
        let sy = (dy as u64 * raster.height() as u64 / dest_h as u64) as u32;
        for dx in 0..dest_w {
            let px = x0 + dx;
            if px < 0 || px >= canvas.width() as i32 {
                continue;
            }
            let sx = (dx as u64 * raster.width() as u64 / dest_w as u64) as u32;
            if raster.is_dark(sx, sy) {
                canvas.put_pixel(px as u32, py as u32, black);
            }
        }
    }
}

fn fill_rect(canvas: &mut Canvas, x: i32, y: i32, width: i32, height: i32, color: Color) {
    if width <= 0 || height <= 0 {
        return;
    }
    let width_px = canvas.width() as i32;
    let height_px = canvas.height() as i32;
    let x0 = x.clamp(0, width_px);
    let y0 = y.clamp(0, height_px);
    let x1 = (x + width).clamp(0, width_px);
    let y1 = (y + height).clamp(0, height_px);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let rgba = color_to_rgba(color);
    for yy in y0..y1 {
        for xx in x0..x1 {
            canvas.put_pixel(xx as u32, yy as u32, rgba);
        }
    }
}

fn visible(position: i32, dash: Option<(i32, i32)>) -> bool {
    match dash {
        Some((on, off)) => position.rem_euclid(on + off) < on,
        None => true,
    }
}

fn draw_hline(canvas: &mut Canvas, x0: i32, x1: i32, y: i32, stroke: Stroke, dash: Option<(i32, i32)>) {
    if y < 0 || y >= canvas.height() as i32 {
        return;
    }
    let start = x0.min(x1).max(0);
    let end = x0.max(x1).min(canvas.width() as i32 - 1);
    let rgba = color_to_rgba(stroke.color);
    for x in start..=end {
        if visible(x - start, dash) {
            canvas.put_pixel(x as u32, y as u32, rgba);
        }
    }
}

fn draw_vline(canvas: &mut Canvas, x: i32, y0: i32, y1: i32, stroke: Stroke, dash: Option<(i32, i32)>) {
    if x < 0 || x >= canvas.width() as i32 {
        return;
    }
    let start = y0.min(y1).max(0);
    let end = y0.max(y1).min(canvas.height() as i32 - 1);
    let rgba = color_to_rgba(stroke.color);
    for y in start..=end {
        if visible(y - start, dash) {
            canvas.put_pixel(x as u32, y as u32, rgba);
        }
    }
}

fn color_to_rgba(color: Color) -> Rgba<u8> {
    Rgba([
        clamp_to_u8(color.r),
        clamp_to_u8(color.g),
        clamp_to_u8(color.b),
        clamp_to_u8(color.a),
    ])
}

fn clamp_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{FontWeight, PrintDisplayList, Size};
    use image::GenericImageView;

    fn page(commands: Vec<DisplayCommand>) -> PageLayout {
        let mut page = PageLayout::new(
            1,
            Size {
                width: 72.0,
                height: 36.0,
            },
            vec![0],
        );
        page.display_list = PrintDisplayList { commands };
        page
    }

    #[test]
    fn preview_size_follows_dpi() {
        let entry = render_preview_png(&page(Vec::new()), 144).unwrap();
        assert_eq!((entry.width_px, entry.height_px), (144, 72));
        let decoded = image::load_from_memory(&entry.data).unwrap();
        assert_eq!(decoded.dimensions(), (144, 72));
    }

    #[test]
    fn text_is_drawn_above_baseline_from_bottom_left_origin() {
        let run = TextRun::new("MMMM", FontWeight::Bold, 10.0, 0.0, 10.0);
        let entry = render_preview_png(&page(vec![DisplayCommand::Text(run)]), 72).unwrap();
        let decoded = image::load_from_memory(&entry.data).unwrap().to_rgba8();
        // baseline at y = 10 pt from the bottom -> row 26 from the top
        assert_ne!(decoded.get_pixel(2, 24).0, [255, 255, 255, 255]);
        assert_eq!(decoded.get_pixel(2, 30).0, [255, 255, 255, 255]);
    }
}
