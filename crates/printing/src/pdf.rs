//! Minimal PDF 1.4 writer for label pages.
//!
//! Text uses the standard Helvetica pair with WinAnsiEncoding, so no font
//! program is embedded. Rasters become 1-bit DeviceGray image XObjects.

use std::fmt::Write as _;

use encoding_rs::WINDOWS_1252;
use labelkit_barcode::Raster;

use crate::display::{Color, DisplayCommand, FontWeight, Stroke, TextAnchor, TextRun};
use crate::error::LabelError;
use crate::font_metrics::{base_font, text_width};
use crate::layout::PageLayout;

/// Assembles all pages into one document.
pub fn render_pdf(pages: &[PageLayout]) -> Result<Vec<u8>, LabelError> {
    if pages.is_empty() {
        return Err(LabelError::Pdf("layout produced no pages".to_string()));
    }

    let mut builder = PdfBuilder::new();
    let pages_object = builder.reserve();
    let regular = builder.add_object(font_dictionary(FontWeight::Regular));
    let bold = builder.add_object(font_dictionary(FontWeight::Bold));
    let mut page_objects = Vec::with_capacity(pages.len());

    for page in pages {
        let mut stream = String::new();
        let mut images = Vec::new();
        for command in &page.display_list.commands {
            match command {
                DisplayCommand::Text(run) => write_text(&mut stream, run)?,
                DisplayCommand::Rect(rect) => {
                    if let Some(dash) = rect.dash {
                        writeln!(stream, "[{} {}] 0 d", num(dash.on), num(dash.off))
                            .map_err(pdf_error)?;
                    }
                    write_stroke(&mut stream, rect.stroke)?;
                    writeln!(
                        stream,
                        "{} {} {} {} re S",
                        num(rect.origin.x),
                        num(rect.origin.y),
                        num(rect.size.width),
                        num(rect.size.height)
                    )
                    .map_err(pdf_error)?;
                    if rect.dash.is_some() {
                        writeln!(stream, "[] 0 d").map_err(pdf_error)?;
                    }
                }
                DisplayCommand::Line { start, end, stroke } => {
                    write_stroke(&mut stream, *stroke)?;
                    writeln!(
                        stream,
                        "{} {} m {} {} l S",
                        num(start.x),
                        num(start.y),
                        num(end.x),
                        num(end.y)
                    )
                    .map_err(pdf_error)?;
                }
                DisplayCommand::Image(image) => {
                    let name = format!("Im{}", images.len() + 1);
                    let object = builder.add_stream(&image_dictionary(&image.raster), &pack_bits(&image.raster));
                    writeln!(
                        stream,
                        "q {} 0 0 {} {} {} cm /{name} Do Q",
                        num(image.size.width),
                        num(image.size.height),
                        num(image.origin.x),
                        num(image.origin.y)
                    )
                    .map_err(pdf_error)?;
                    images.push((name, object));
                }
            }
        }

        let content = builder.add_stream("", stream.as_bytes());
        let xobjects = if images.is_empty() {
            String::new()
        } else {
            let entries = images
                .iter()
                .map(|(name, object)| format!("/{name} {object} 0 R"))
                .collect::<Vec<_>>()
                .join(" ");
            format!(" /XObject << {entries} >>")
        };
        let page_object = builder.add_object(format!(
            "<< /Type /Page /Parent {pages_object} 0 R /MediaBox [0 0 {width} {height}] \
             /Resources << /Font << /F1 {regular} 0 R /F2 {bold} 0 R >>{xobjects} >> \
             /Contents {content} 0 R >>",
            width = num(page.size.width),
            height = num(page.size.height),
        ));
        page_objects.push(page_object);
    }

    let kids = page_objects
        .iter()
        .map(|object| format!("{object} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    builder.fill(
        pages_object,
        format!(
            "<< /Type /Pages /Count {count} /Kids [{kids}] >>",
            count = page_objects.len()
        ),
    );
    let catalog = builder.add_object(format!("<< /Type /Catalog /Pages {pages_object} 0 R >>"));

    Ok(builder.finish(catalog))
}

fn pdf_error(err: std::fmt::Error) -> LabelError {
    LabelError::Pdf(err.to_string())
}

fn font_dictionary(weight: FontWeight) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        base_font(weight)
    )
}

fn font_resource(weight: FontWeight) -> &'static str {
    match weight {
        FontWeight::Regular => "F1",
        FontWeight::Bold => "F2",
    }
}

fn write_text(stream: &mut String, run: &TextRun) -> Result<(), LabelError> {
    let width = text_width(&run.text, run.weight, run.font_size_pt);
    let x = match run.anchor {
        TextAnchor::Start => run.position.x,
        TextAnchor::Middle => run.position.x - width / 2.0,
        TextAnchor::End => run.position.x - width,
    };
    writeln!(
        stream,
        "{color} rg\nBT\n/{font} {size} Tf\n1 0 0 1 {x} {y} Tm\n({text}) Tj\nET",
        color = rgb(run.color),
        font = font_resource(run.weight),
        size = num(run.font_size_pt),
        x = num(x),
        y = num(run.position.y),
        text = escape_text(&run.text),
    )
    .map_err(pdf_error)
}

fn write_stroke(stream: &mut String, stroke: Stroke) -> Result<(), LabelError> {
    writeln!(stream, "{} RG\n{} w", rgb(stroke.color), num(stroke.width)).map_err(pdf_error)
}

fn num(value: f32) -> String {
    format!("{:.3}", value)
}

fn rgb(color: Color) -> String {
    format!(
        "{:.3} {:.3} {:.3}",
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0)
    )
}

/// WinAnsi bytes of `input` as a literal string body. Characters outside
/// Windows-1252 print as `?`.
fn escape_text(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut buffer = [0u8; 4];
    for ch in input.chars() {
        let (bytes, _, unmappable) = WINDOWS_1252.encode(ch.encode_utf8(&mut buffer));
        let byte = if unmappable || bytes.len() != 1 {
            b'?'
        } else {
            bytes[0]
        };
        match byte {
            b'(' | b')' | b'\\' => {
                output.push('\\');
                output.push(byte as char);
            }
            0x20..=0x7E => output.push(byte as char),
            other => {
                let _ = write!(output, "\\{:03o}", other);
            }
        }
    }
    output
}

fn image_dictionary(raster: &Raster) -> String {
    format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} \
         /ColorSpace /DeviceGray /BitsPerComponent 1",
        raster.width(),
        raster.height()
    )
}

/// Packs the raster MSB-first, one padded row at a time. A set bit is white
/// in DeviceGray, so only dark pixels clear their bit.
fn pack_bits(raster: &Raster) -> Vec<u8> {
    let (width, height) = (raster.width(), raster.height());
    let row_bytes = ((width + 7) / 8) as usize;
    let mut out = vec![0xFFu8; row_bytes * height as usize];
    for y in 0..height {
        for x in 0..width {
            if raster.is_dark(x, y) {
                let index = y as usize * row_bytes + (x as usize / 8);
                out[index] &= !(1 << (7 - (x as usize % 8)));
            }
        }
    }
    out
}

struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Allocates an object number to be filled in later.
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len()
    }

    fn fill(&mut self, number: usize, body: String) {
        self.objects[number - 1] = body.into_bytes();
    }

    fn add_object(&mut self, body: impl Into<String>) -> usize {
        self.objects.push(body.into().into_bytes());
        self.objects.len()
    }

    fn add_stream(&mut self, dictionary: &str, data: &[u8]) -> usize {
        let separator = if dictionary.is_empty() { "" } else { " " };
        let mut body =
            format!("<< {dictionary}{separator}/Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.objects.push(body);
        self.objects.len()
    }

    fn finish(self, catalog: usize) -> Vec<u8> {
        let mut output = Vec::new();
        output.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        let mut offsets = Vec::with_capacity(self.objects.len());

        for (index, body) in self.objects.iter().enumerate() {
            offsets.push(output.len());
            output.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
            output.extend_from_slice(body);
            output.extend_from_slice(b"\nendobj\n");
        }

        let xref_start = output.len();
        let mut trailer = format!("xref\n0 {}\n0000000000 65535 f \n", self.objects.len() + 1);
        for offset in offsets {
            trailer.push_str(&format!("{:010} 00000 n \n", offset));
        }
        trailer.push_str(&format!(
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.objects.len() + 1,
            catalog,
            xref_start
        ));
        output.extend_from_slice(trailer.as_bytes());
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Point, PrintDisplayList, Size};
    use crate::layout::PageLayout;

    fn page_with(commands: Vec<DisplayCommand>) -> PageLayout {
        let mut page = PageLayout::new(
            1,
            Size {
                width: 170.0,
                height: 85.0,
            },
            vec![0],
        );
        page.display_list = PrintDisplayList { commands };
        page
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(matches!(render_pdf(&[]), Err(LabelError::Pdf(_))));
    }

    #[test]
    fn pages_have_media_box_and_fonts() {
        let run = TextRun::new("Olá (teste)", FontWeight::Bold, 9.0, 5.0, 70.0);
        let pdf = render_pdf(&[page_with(vec![DisplayCommand::Text(run)])]).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(contains(&pdf, b"/MediaBox [0 0 170.000 85.000]"));
        assert!(contains(&pdf, b"/BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding"));
        assert!(contains(&pdf, b"/F2 9.000 Tf"));
        assert!(contains(&pdf, b"(Ol\\341 \\(teste\\)) Tj"));
        assert!(contains(&pdf, b"/Type /Pages /Count 1"));
    }

    #[test]
    fn end_anchor_shifts_text_left_by_its_width() {
        let run = TextRun::new("SP", FontWeight::Regular, 10.0, 100.0, 10.0)
            .anchored(TextAnchor::End);
        let pdf = render_pdf(&[page_with(vec![DisplayCommand::Text(run)])]).unwrap();
        // S = 667, P = 667 -> 13.34 pt
        assert!(contains(&pdf, b"1 0 0 1 86.660 10.000 Tm"));
    }

    #[test]
    fn unmappable_characters_become_question_marks() {
        assert_eq!(escape_text("a\u{4e2d}b"), "a?b");
        assert_eq!(escape_text("Ç"), "\\307");
    }

    #[test]
    fn rasters_become_one_bit_xobjects() {
        let mut image = image::GrayImage::from_pixel(10, 2, image::Luma([255]));
        image.put_pixel(0, 0, image::Luma([0]));
        image.put_pixel(9, 1, image::Luma([0]));
        let raster = Raster::new(image, 300);
        assert_eq!(pack_bits(&raster), vec![0x7F, 0xFF, 0xFF, 0xBF]);

        let placement = crate::display::ImagePlacement {
            origin: Point { x: 1.0, y: 2.0 },
            size: Size {
                width: 30.0,
                height: 6.0,
            },
            raster: std::sync::Arc::new(raster),
        };
        let pdf = render_pdf(&[page_with(vec![DisplayCommand::Image(placement)])]).unwrap();
        assert!(contains(&pdf, b"/Subtype /Image /Width 10 /Height 2"));
        assert!(contains(&pdf, b"/BitsPerComponent 1 /Length 4"));
        assert!(contains(&pdf, b"/XObject << /Im1 "));
        assert!(contains(&pdf, b"q 30.000 0 0 6.000 1.000 2.000 cm /Im1 Do Q"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let pdf = render_pdf(&[page_with(Vec::new()), page_with(Vec::new())]).unwrap();
        let start = pdf
            .windows(6)
            .rposition(|window| window == b"\nxref\n")
            .unwrap()
            + 1;
        let table = std::str::from_utf8(&pdf[start..]).unwrap();
        let mut lines = table.lines().skip(1);
        let size: usize = lines
            .next()
            .and_then(|line| line.strip_prefix("0 "))
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(lines.next(), Some("0000000000 65535 f "));

        for object in 1..size {
            let entry = lines.next().unwrap();
            let offset: usize = entry[..10].parse().unwrap();
            let header = format!("{object} 0 obj\n");
            assert!(
                pdf[offset..].starts_with(header.as_bytes()),
                "object {object} not at offset {offset}"
            );
        }
        assert!(contains(&pdf, b"/Count 2"));
    }
}
