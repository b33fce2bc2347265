use std::fmt;
use std::sync::Arc;

use labelkit_barcode::Raster;

/// Device-independent drawing commands for one page, in points with the
/// origin at the bottom-left corner.
#[derive(Debug, Clone, Default)]
pub struct PrintDisplayList {
    pub commands: Vec<DisplayCommand>,
}

impl PrintDisplayList {
    /// Append a command to the display list.
    pub fn push(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = DisplayCommand>) {
        self.commands.extend(commands);
    }

    /// Returns true if the display list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.commands.iter().filter_map(|command| match command {
            DisplayCommand::Text(run) => Some(run),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &ImagePlacement> {
        self.commands.iter().filter_map(|command| match command {
            DisplayCommand::Image(image) => Some(image),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub enum DisplayCommand {
    Text(TextRun),
    Rect(Rectangle),
    Line {
        start: Point,
        end: Point,
        stroke: Stroke,
    },
    Image(ImagePlacement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Which point of the run sits on `position.x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// A single line of Helvetica text; `position` is on the baseline.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub weight: FontWeight,
    pub font_size_pt: f32,
    pub position: Point,
    pub anchor: TextAnchor,
    pub color: Color,
}

impl TextRun {
    pub fn new(text: impl Into<String>, weight: FontWeight, font_size_pt: f32, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            weight,
            font_size_pt,
            position: Point { x, y },
            anchor: TextAnchor::Start,
            color: Color::BLACK,
        }
    }

    pub fn anchored(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Outlined (optionally dashed) rectangle.
#[derive(Debug, Clone, Copy)]
pub struct Rectangle {
    pub origin: Point,
    pub size: Size,
    pub stroke: Stroke,
    pub dash: Option<Dash>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub on: f32,
    pub off: f32,
}

/// Raster drawn into a box; `origin` is the box's bottom-left corner.
#[derive(Debug, Clone)]
pub struct ImagePlacement {
    pub origin: Point,
    pub size: Size,
    pub raster: Arc<Raster>,
}

/// 2D size representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// RGBA color stored in normalized floating-point form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const LIGHT_GREY: Color = Color::new(0.827, 0.827, 0.827, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Stroke descriptor for simple line drawing.
#[derive(Debug, Clone, Copy)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

impl Stroke {
    pub const fn hairline(color: Color) -> Self {
        Self { width: 1.0, color }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({:.3}, {:.3}, {:.3}, {:.3})",
            self.r, self.g, self.b, self.a
        )
    }
}
