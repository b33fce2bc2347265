//! Label layout, PDF page streams and previews.
//!
//! [`LabelGenerator`] is the entry point: it resolves a format identifier,
//! lays out one or more labels into per-page display lists and assembles the
//! PDF. The lower-level pieces are public so callers can inspect geometry
//! without producing a document.

pub mod display;
pub mod error;
pub mod font_metrics;
pub mod format;
pub mod generator;
pub mod layout;
pub mod marks;
pub mod pdf;
pub mod preview;

pub use display::{
    Color, Dash, DisplayCommand, FontWeight, ImagePlacement, Point, PrintDisplayList, Rectangle,
    Size, Stroke, TextAnchor, TextRun,
};
pub use error::LabelError;
pub use format::{mm, FormatKind, GridSpec, LabelFormat, LabelFormatId, PaperSize};
pub use generator::{GeneratedDocument, GenerationId, LabelGenerator};
pub use layout::{
    cell_origin, grid_position, pages_required, paginator_for, EnvelopeLayout, GridPosition,
    LabelEntry, LabelWarning, LayoutContext, LayoutOptions, LayoutSummary, MultiUpLayout,
    PageLayout, PaginationResult, Paginator, ThermalLayout, WarningKind,
};
pub use pdf::render_pdf;
pub use preview::{render_preview_png, PreviewEntry};
