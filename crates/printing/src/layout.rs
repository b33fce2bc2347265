use std::fmt;

use labelkit_address::{
    destination_lines, max_chars, max_chars_for_canvas, sender_lines, truncate_line, Address,
    Sender,
};
use labelkit_barcode::{CepnetRenderer, MatrixSymbolEncoder};
use labelkit_settings::GenerationConfig;
use serde::Deserialize;

use crate::display::{
    Color, Dash, DisplayCommand, FontWeight, Point, PrintDisplayList, Rectangle, Size, Stroke,
    TextAnchor, TextRun,
};
use crate::format::{mm, FormatKind, GridSpec, LabelFormat, PaperSize};
use crate::marks::{cepnet_fragment, matrix_fragment, payload_for, Slot};

const THERMAL_MARGIN_MM: f32 = 2.0;
const THERMAL_WIDTH_FACTOR: f32 = 0.5;
const THERMAL_SENDER_SIZE: f32 = 6.0;
const THERMAL_SENDER_STEP: f32 = 8.0;
const THERMAL_SENDER_BASE_MM: f32 = 3.0;
const THERMAL_MATRIX_MM: f32 = 18.0;
const THERMAL_MATRIX_GAP_MM: f32 = 2.0;

const CELL_PADDING_MM: f32 = 3.0;
const CELL_WIDTH_FACTOR: f32 = 0.45;
const CELL_BARCODE_MAX_W_MM: f32 = 60.0;
const CELL_BARCODE_H_MM: f32 = 10.0;

const ENVELOPE_MARGIN_MM: f32 = 10.0;
const ENVELOPE_WIDTH_FACTOR: f32 = 0.5;
const ENVELOPE_SENDER_SIZE: f32 = 8.0;
const ENVELOPE_SENDER_STEP: f32 = 10.0;
const ENVELOPE_RULE_END: f32 = 0.35;
const ENVELOPE_DEST_X: f32 = 0.38;
const ENVELOPE_DEST_Y: f32 = 0.55;
const ENVELOPE_BARCODE_W_MM: f32 = 70.0;
const ENVELOPE_BARCODE_H_MM: f32 = 12.0;
const ENVELOPE_BARCODE_DROP_MM: f32 = 15.0;
const ENVELOPE_MATRIX_MM: f32 = 18.0;
const ENVELOPE_MATRIX_GAP_MM: f32 = 5.0;
const POSTAGE_W_MM: f32 = 35.0;
const POSTAGE_H_MM: f32 = 25.0;

/// One logical label: display name, destination and an optional tracking
/// code for the 2-D symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelEntry {
    #[serde(rename = "cliente_nome", default)]
    pub name: String,
    #[serde(rename = "endereco")]
    pub address: Address,
    #[serde(rename = "codigo_rastreamento", default)]
    pub tracking_code: Option<String>,
}

impl LabelEntry {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
            tracking_code: None,
        }
    }
}

/// Per-call switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    pub include_barcode: bool,
    pub include_sender: bool,
    pub barcode_caption: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            include_barcode: true,
            include_sender: false,
            barcode_caption: true,
        }
    }
}

/// Everything a layout pass reads besides the labels themselves.
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    pub config: &'a GenerationConfig,
    pub sender: Option<&'a Sender>,
    pub matrix_encoder: Option<&'a dyn MatrixSymbolEncoder>,
    pub options: LayoutOptions,
}

impl<'a> LayoutContext<'a> {
    pub fn new(config: &'a GenerationConfig, options: LayoutOptions) -> Self {
        Self {
            config,
            sender: None,
            matrix_encoder: None,
            options,
        }
    }

    pub fn with_sender(mut self, sender: Option<&'a Sender>) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_matrix_encoder(mut self, encoder: Option<&'a dyn MatrixSymbolEncoder>) -> Self {
        self.matrix_encoder = encoder;
        self
    }

    fn barcode_enabled(&self) -> bool {
        self.options.include_barcode && self.config.include_cepnet
    }

    fn renderer(&self) -> CepnetRenderer {
        CepnetRenderer::new(self.config.dpi)
    }

    fn sender_block(&self) -> Option<&'a Sender> {
        if self.options.include_sender {
            self.sender
        } else {
            None
        }
    }

    fn check_min_font(&self, font_size: f32, format: &str) {
        if font_size < self.config.min_font_size {
            tracing::warn!(
                format,
                font_size,
                minimum = self.config.min_font_size,
                "destination font is below the configured minimum"
            );
        }
    }
}

impl fmt::Debug for LayoutContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutContext")
            .field("config", self.config)
            .field("sender", &self.sender)
            .field("matrix_encoder", &self.matrix_encoder.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// A single physical page with the indices of the labels drawn on it.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub page_number: u32,
    pub size: Size,
    pub labels: Vec<usize>,
    pub display_list: PrintDisplayList,
}

impl PageLayout {
    pub fn new(page_number: u32, size: Size, labels: Vec<usize>) -> Self {
        Self {
            page_number,
            size,
            labels,
            display_list: PrintDisplayList::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    BarcodeOmitted,
    MatrixSymbolOmitted,
}

/// A degraded but completed label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelWarning {
    pub label_index: usize,
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for LabelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            WarningKind::BarcodeOmitted => "bar code omitted",
            WarningKind::MatrixSymbolOmitted => "2-D symbol omitted",
        };
        write!(f, "label {}: {what}: {}", self.label_index, self.message)
    }
}

/// Summary produced after pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSummary {
    pub total_pages: u32,
    pub total_labels: usize,
}

/// Result from running a layout engine.
#[derive(Debug, Clone)]
pub struct PaginationResult {
    pub pages: Vec<PageLayout>,
    pub summary: LayoutSummary,
    pub warnings: Vec<LabelWarning>,
}

impl PaginationResult {
    fn from_pages(pages: Vec<PageLayout>, total_labels: usize, warnings: Vec<LabelWarning>) -> Self {
        Self {
            summary: LayoutSummary {
                total_pages: pages.len() as u32,
                total_labels,
            },
            pages,
            warnings,
        }
    }
}

/// Contract implemented by the per-format layout engines.
pub trait Paginator {
    fn paginate(&self, entries: &[LabelEntry], ctx: &LayoutContext<'_>) -> PaginationResult;
}

/// Picks the layout engine for a catalog entry.
pub fn paginator_for(format: &LabelFormat) -> Box<dyn Paginator> {
    match format.kind {
        FormatKind::Thermal => Box::new(ThermalLayout::new(format.size)),
        FormatKind::MultiUp { sheet, grid } => Box::new(MultiUpLayout::new(format.size, sheet, grid)),
        FormatKind::Envelope => Box::new(EnvelopeLayout::new(format.size)),
    }
}

/// Grid slot of the `index`-th label (0-based, row-major fill).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub page: usize,
    pub row: usize,
    pub column: usize,
}

pub fn grid_position(grid: &GridSpec, index: usize) -> GridPosition {
    let per_page = grid.per_page().max(1);
    let slot = index % per_page;
    GridPosition {
        page: index / per_page,
        row: slot / grid.columns.max(1),
        column: slot % grid.columns.max(1),
    }
}

/// Bottom-left corner of a cell, in points.
pub fn cell_origin(grid: &GridSpec, cell: PaperSize, sheet: PaperSize, position: GridPosition) -> Point {
    let (_, page_height) = sheet.to_points();
    let row = position.row as f32;
    let column = position.column as f32;
    Point {
        x: mm(grid.margin_left) + column * (mm(cell.width_mm) + mm(grid.spacing_h)),
        y: page_height - mm(grid.margin_top) - (row + 1.0) * mm(cell.height_mm)
            - row * mm(grid.spacing_v),
    }
}

pub fn pages_required(labels: usize, per_page: usize) -> usize {
    let per_page = per_page.max(1);
    (labels + per_page - 1) / per_page
}

/// Font sizes of the four-line destination block; first and last lines are
/// bold.
#[derive(Debug, Clone, Copy)]
struct BlockStyle {
    first: f32,
    middle: f32,
    last: f32,
    line_height: f32,
}

impl BlockStyle {
    fn line(&self, index: usize, count: usize) -> (FontWeight, f32) {
        if index == 0 {
            (FontWeight::Bold, self.first)
        } else if index + 1 == count {
            (FontWeight::Bold, self.last)
        } else {
            (FontWeight::Regular, self.middle)
        }
    }
}

/// Draws `lines` left-aligned at `x`, stepping down `line_height` before each
/// line. Returns the last baseline.
fn push_block(
    list: &mut PrintDisplayList,
    lines: &[String],
    style: BlockStyle,
    x: f32,
    top: f32,
    max_chars: usize,
) -> f32 {
    let mut y = top;
    for (index, line) in lines.iter().enumerate() {
        let (weight, size) = style.line(index, lines.len());
        y -= style.line_height;
        let text = truncate_line(line, max_chars);
        list.push(DisplayCommand::Text(TextRun::new(text, weight, size, x, y)));
    }
    y
}

fn warn_barcode(warnings: &mut Vec<LabelWarning>, label_index: usize, reason: impl fmt::Display) {
    tracing::warn!(label_index, %reason, "bar code omitted from label");
    warnings.push(LabelWarning {
        label_index,
        kind: WarningKind::BarcodeOmitted,
        message: reason.to_string(),
    });
}

fn warn_matrix(warnings: &mut Vec<LabelWarning>, label_index: usize, reason: impl fmt::Display) {
    tracing::warn!(label_index, %reason, "2-D symbol omitted from label");
    warnings.push(LabelWarning {
        label_index,
        kind: WarningKind::MatrixSymbolOmitted,
        message: reason.to_string(),
    });
}

/// Draws the bar code into `slot`, turning a failure into a warning.
fn place_barcode(
    list: &mut PrintDisplayList,
    warnings: &mut Vec<LabelWarning>,
    ctx: &LayoutContext<'_>,
    entry: &LabelEntry,
    label_index: usize,
    slot: Slot,
) {
    if !ctx.barcode_enabled() {
        return;
    }
    match cepnet_fragment(
        &ctx.renderer(),
        &entry.address.postal_code,
        slot,
        ctx.options.barcode_caption,
    ) {
        Ok(commands) => list.extend(commands),
        Err(err) => warn_barcode(warnings, label_index, err),
    }
}

/// Tries to draw the 2-D symbol into `slot`; returns whether it was drawn.
fn place_matrix(
    list: &mut PrintDisplayList,
    warnings: &mut Vec<LabelWarning>,
    ctx: &LayoutContext<'_>,
    entry: &LabelEntry,
    label_index: usize,
    slot: Slot,
) -> bool {
    if !ctx.config.include_datamatrix {
        return false;
    }
    let Some(encoder) = ctx.matrix_encoder else {
        warn_matrix(warnings, label_index, "no 2-D symbol encoder configured");
        return false;
    };
    let Some(sender) = ctx.sender else {
        warn_matrix(warnings, label_index, "no sender configured for the origin fields");
        return false;
    };
    let payload = payload_for(
        &entry.address,
        sender,
        &ctx.config.datamatrix,
        entry.tracking_code.as_deref(),
    );
    match matrix_fragment(encoder, &payload, slot, ctx.config.dpi) {
        Ok(commands) => {
            list.extend(commands);
            true
        }
        Err(err) => {
            warn_matrix(warnings, label_index, err);
            false
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ThermalStyle {
    font_size: f32,
    barcode_width_mm: f32,
    barcode_height_mm: f32,
    barcode_y_mm: f32,
    sender_block: bool,
    matrix_symbol: bool,
}

/// Single-label canvas for thermal rolls.
#[derive(Debug, Clone, Copy)]
pub struct ThermalLayout {
    size: PaperSize,
    style: ThermalStyle,
}

impl ThermalLayout {
    pub fn new(size: PaperSize) -> Self {
        let small = ThermalStyle {
            font_size: 8.0,
            barcode_width_mm: 45.0,
            barcode_height_mm: 8.0,
            barcode_y_mm: 2.0,
            sender_block: false,
            matrix_symbol: false,
        };
        let large = ThermalStyle {
            font_size: 10.0,
            barcode_width_mm: 65.0,
            barcode_height_mm: 12.0,
            barcode_y_mm: 5.0,
            sender_block: true,
            matrix_symbol: true,
        };
        // the 100 mm roll gets the larger typography
        let style = if size.width_mm >= 100.0 { large } else { small };
        Self { size, style }
    }

    fn draw(
        &self,
        page: &mut PageLayout,
        warnings: &mut Vec<LabelWarning>,
        ctx: &LayoutContext<'_>,
        entry: &LabelEntry,
        label_index: usize,
    ) {
        let (width, height) = self.size.to_points();
        let margin = mm(THERMAL_MARGIN_MM);
        let font = self.style.font_size;
        let list = &mut page.display_list;

        let mut text_width = width;
        if self.style.matrix_symbol {
            let side = mm(THERMAL_MATRIX_MM);
            let slot = Slot::new(width - margin - side, height - margin - side, side, side);
            if place_matrix(list, warnings, ctx, entry, label_index, slot) {
                text_width -= side + mm(THERMAL_MATRIX_GAP_MM);
            }
        }

        let lines = destination_lines(&entry.address, &entry.name);
        let style = BlockStyle {
            first: font + 1.0,
            middle: font,
            last: font,
            line_height: font + 3.0,
        };
        let budget = max_chars_for_canvas(text_width, margin, font, THERMAL_WIDTH_FACTOR);
        push_block(list, &lines, style, margin, height - margin, budget);

        place_barcode(
            list,
            warnings,
            ctx,
            entry,
            label_index,
            Slot::new(
                margin,
                mm(self.style.barcode_y_mm),
                mm(self.style.barcode_width_mm),
                mm(self.style.barcode_height_mm),
            ),
        );

        if self.style.sender_block {
            if let Some(sender) = ctx.sender_block() {
                let budget =
                    max_chars_for_canvas(width, margin, THERMAL_SENDER_SIZE, THERMAL_WIDTH_FACTOR);
                let mut y = mm(THERMAL_SENDER_BASE_MM);
                for line in sender_lines(sender).iter().rev() {
                    list.push(DisplayCommand::Text(
                        TextRun::new(
                            truncate_line(line, budget),
                            FontWeight::Regular,
                            THERMAL_SENDER_SIZE,
                            width - margin,
                            y,
                        )
                        .anchored(TextAnchor::End),
                    ));
                    y += THERMAL_SENDER_STEP;
                }
            }
        }
    }
}

impl Paginator for ThermalLayout {
    fn paginate(&self, entries: &[LabelEntry], ctx: &LayoutContext<'_>) -> PaginationResult {
        ctx.check_min_font(self.style.font_size, "thermal");
        let (width, height) = self.size.to_points();
        let mut warnings = Vec::new();
        let mut pages = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let mut page = PageLayout::new(
                index as u32 + 1,
                Size { width, height },
                vec![index],
            );
            self.draw(&mut page, &mut warnings, ctx, entry, index);
            pages.push(page);
        }
        PaginationResult::from_pages(pages, entries.len(), warnings)
    }
}

/// Grid of cells on an adhesive sheet.
#[derive(Debug, Clone, Copy)]
pub struct MultiUpLayout {
    cell: PaperSize,
    sheet: PaperSize,
    grid: GridSpec,
    font_size: f32,
}

impl MultiUpLayout {
    pub fn new(cell: PaperSize, sheet: PaperSize, grid: GridSpec) -> Self {
        // dense sheets get the smaller font
        let font_size = if grid.per_page() > 6 { 8.0 } else { 9.0 };
        Self {
            cell,
            sheet,
            grid,
            font_size,
        }
    }

    fn draw_cell(
        &self,
        list: &mut PrintDisplayList,
        warnings: &mut Vec<LabelWarning>,
        ctx: &LayoutContext<'_>,
        entry: &LabelEntry,
        label_index: usize,
        origin: Point,
    ) {
        let padding = mm(CELL_PADDING_MM);
        let width = mm(self.cell.width_mm);
        let height = mm(self.cell.height_mm);
        let font = self.font_size;

        let lines = destination_lines(&entry.address, &entry.name);
        let style = BlockStyle {
            first: font,
            middle: font - 1.0,
            last: font - 1.0,
            line_height: font + 3.0,
        };
        let budget = max_chars_for_canvas(width, padding, font, CELL_WIDTH_FACTOR);
        push_block(
            list,
            &lines,
            style,
            origin.x + padding,
            origin.y + height - padding,
            budget,
        );

        let barcode_width = mm(CELL_BARCODE_MAX_W_MM).min(width - 2.0 * padding);
        place_barcode(
            list,
            warnings,
            ctx,
            entry,
            label_index,
            Slot::new(
                origin.x + padding,
                origin.y + padding,
                barcode_width,
                mm(CELL_BARCODE_H_MM),
            ),
        );
    }
}

impl Paginator for MultiUpLayout {
    fn paginate(&self, entries: &[LabelEntry], ctx: &LayoutContext<'_>) -> PaginationResult {
        ctx.check_min_font(self.font_size, "multi-up");
        let (width, height) = self.sheet.to_points();
        let total_pages = pages_required(entries.len(), self.grid.per_page());
        let mut pages: Vec<PageLayout> = (0..total_pages)
            .map(|page| PageLayout::new(page as u32 + 1, Size { width, height }, Vec::new()))
            .collect();
        let mut warnings = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            let position = grid_position(&self.grid, index);
            let origin = cell_origin(&self.grid, self.cell, self.sheet, position);
            tracing::debug!(
                index,
                page = position.page,
                row = position.row,
                column = position.column,
                "placing label cell"
            );
            let page = &mut pages[position.page];
            page.labels.push(index);
            self.draw_cell(
                &mut page.display_list,
                &mut warnings,
                ctx,
                entry,
                index,
                origin,
            );
        }

        PaginationResult::from_pages(pages, entries.len(), warnings)
    }
}

/// Area-based envelope layout: sender top-left, postage box top-right,
/// destination block right of center with the bar code beneath it.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeLayout {
    size: PaperSize,
    font_size: f32,
}

impl EnvelopeLayout {
    pub fn new(size: PaperSize) -> Self {
        // the taller C5 envelope gets one point more
        let font_size = if size.height_mm > 150.0 { 12.0 } else { 11.0 };
        Self { size, font_size }
    }

    fn draw(
        &self,
        page: &mut PageLayout,
        warnings: &mut Vec<LabelWarning>,
        ctx: &LayoutContext<'_>,
        entry: &LabelEntry,
        label_index: usize,
    ) {
        let (width, height) = self.size.to_points();
        let margin = mm(ENVELOPE_MARGIN_MM);
        let list = &mut page.display_list;

        if let Some(sender) = ctx.sender_block() {
            let rule_end = width * ENVELOPE_RULE_END;
            let budget = max_chars(rule_end - margin, ENVELOPE_SENDER_SIZE, ENVELOPE_WIDTH_FACTOR);
            let mut y = height - margin;
            for line in sender_lines(sender) {
                list.push(DisplayCommand::Text(TextRun::new(
                    truncate_line(&line, budget),
                    FontWeight::Regular,
                    ENVELOPE_SENDER_SIZE,
                    margin,
                    y,
                )));
                y -= ENVELOPE_SENDER_STEP;
            }
            list.push(DisplayCommand::Line {
                start: Point { x: margin, y: y - 5.0 },
                end: Point { x: rule_end, y: y - 5.0 },
                stroke: Stroke::hairline(Color::LIGHT_GREY),
            });
        }

        let font = self.font_size;
        let style = BlockStyle {
            first: font + 2.0,
            middle: font,
            last: font + 1.0,
            line_height: font + 5.0,
        };
        let dest_x = width * ENVELOPE_DEST_X;
        let dest_y = height * ENVELOPE_DEST_Y;
        let lines = destination_lines(&entry.address, &entry.name);
        let budget = max_chars(width - dest_x - margin, font, ENVELOPE_WIDTH_FACTOR);
        // first baseline sits on dest_y
        let last_baseline = push_block(
            list,
            &lines,
            style,
            dest_x,
            dest_y + style.line_height,
            budget,
        );
        let below_block = last_baseline - style.line_height;

        let barcode_y = below_block - mm(ENVELOPE_BARCODE_DROP_MM);
        place_barcode(
            list,
            warnings,
            ctx,
            entry,
            label_index,
            Slot::new(
                dest_x,
                barcode_y,
                mm(ENVELOPE_BARCODE_W_MM),
                mm(ENVELOPE_BARCODE_H_MM),
            ),
        );

        let matrix_x = dest_x + mm(ENVELOPE_BARCODE_W_MM + ENVELOPE_MATRIX_GAP_MM);
        let side = mm(ENVELOPE_MATRIX_MM).min(width - margin - matrix_x);
        if side > 0.0 {
            place_matrix(
                list,
                warnings,
                ctx,
                entry,
                label_index,
                Slot::new(matrix_x, barcode_y, side, side),
            );
        }

        list.push(DisplayCommand::Rect(Rectangle {
            origin: Point {
                x: width - margin - mm(POSTAGE_W_MM),
                y: height - margin - mm(POSTAGE_H_MM),
            },
            size: Size {
                width: mm(POSTAGE_W_MM),
                height: mm(POSTAGE_H_MM),
            },
            stroke: Stroke::hairline(Color::LIGHT_GREY),
            dash: Some(Dash { on: 2.0, off: 2.0 }),
        }));
    }
}

impl Paginator for EnvelopeLayout {
    fn paginate(&self, entries: &[LabelEntry], ctx: &LayoutContext<'_>) -> PaginationResult {
        ctx.check_min_font(self.font_size, "envelope");
        let (width, height) = self.size.to_points();
        let mut warnings = Vec::new();
        let mut pages = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let mut page = PageLayout::new(
                index as u32 + 1,
                Size { width, height },
                vec![index],
            );
            self.draw(&mut page, &mut warnings, ctx, entry, index);
            pages.push(page);
        }
        PaginationResult::from_pages(pages, entries.len(), warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::LabelFormatId;
    use labelkit_address::AddressRecord;

    fn address(street: &str) -> Address {
        Address::try_from(AddressRecord {
            recipient: None,
            street: street.into(),
            number: "120".into(),
            complement: None,
            district: "Asa Sul".into(),
            city: "Brasilia".into(),
            state: "DF".into(),
            cep: "70390-010".into(),
        })
        .unwrap()
    }

    fn entries(count: usize) -> Vec<LabelEntry> {
        (0..count)
            .map(|i| LabelEntry::new(format!("Cliente {i}"), address("SQS 308 Bloco C")))
            .collect()
    }

    fn layout(id: LabelFormatId, entries: &[LabelEntry], config: &GenerationConfig) -> PaginationResult {
        let ctx = LayoutContext::new(config, LayoutOptions::default());
        paginator_for(&id.format()).paginate(entries, &ctx)
    }

    #[test]
    fn grid_position_fills_row_major_and_wraps_pages() {
        let grid = match LabelFormatId::MultiUp14.format().kind {
            FormatKind::MultiUp { grid, .. } => grid,
            other => panic!("unexpected kind {other:?}"),
        };
        assert_eq!(
            grid_position(&grid, 3),
            GridPosition { page: 0, row: 1, column: 1 }
        );
        assert_eq!(
            grid_position(&grid, 14),
            GridPosition { page: 1, row: 0, column: 0 }
        );
        assert_eq!(pages_required(20, 14), 2);
        assert_eq!(pages_required(14, 14), 1);
        assert_eq!(pages_required(0, 14), 0);
    }

    #[test]
    fn cell_origin_follows_sheet_formula() {
        let format = LabelFormatId::MultiUp14.format();
        let FormatKind::MultiUp { sheet, grid } = format.kind else {
            panic!("expected multi-up");
        };
        let origin = cell_origin(&grid, format.size, sheet, GridPosition { page: 0, row: 2, column: 1 });
        let expected_x = mm(6.35) + mm(99.0) + mm(3.0);
        let expected_y = mm(297.0) - mm(12.7) - 3.0 * mm(38.1);
        assert!((origin.x - expected_x).abs() < 1e-3);
        assert!((origin.y - expected_y).abs() < 1e-3);
    }

    #[test]
    fn twenty_labels_on_fourteen_up_take_two_pages() {
        let config = GenerationConfig::default();
        let result = layout(LabelFormatId::MultiUp14, &entries(20), &config);
        assert_eq!(result.summary.total_pages, 2);
        assert_eq!(result.pages[0].labels.len(), 14);
        assert_eq!(result.pages[1].labels, (14..20).collect::<Vec<_>>());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn thermal_small_draws_four_lines_and_a_barcode() {
        let config = GenerationConfig::default();
        let result = layout(LabelFormatId::ThermalSmall, &entries(1), &config);
        let list = &result.pages[0].display_list;
        let texts: Vec<&TextRun> = list.texts().collect();
        // four destination lines plus the bar code caption
        assert_eq!(texts.len(), 5);
        assert_eq!(texts[0].text, "CLIENTE 0");
        assert_eq!(texts[0].weight, FontWeight::Bold);
        assert_eq!(texts[0].font_size_pt, 9.0);
        assert_eq!(texts[1].weight, FontWeight::Regular);
        assert_eq!(texts[3].weight, FontWeight::Bold);
        assert_eq!(texts[3].text, "70390-010 Brasilia/DF");
        let margin = mm(2.0);
        assert!((texts[0].position.y - (mm(30.0) - margin - 11.0)).abs() < 1e-3);
        assert_eq!(list.images().count(), 1);
    }

    #[test]
    fn thermal_small_truncates_long_lines() {
        let config = GenerationConfig::default();
        let long = "Avenida Presidente Juscelino Kubitschek de Oliveira";
        let entry = LabelEntry::new("Cliente", address(long));
        let result = layout(LabelFormatId::ThermalSmall, &[entry], &config);
        let street = result.pages[0].display_list.texts().nth(1).unwrap();
        let budget = max_chars_for_canvas(mm(60.0), mm(2.0), 8.0, 0.5);
        assert_eq!(street.text.chars().count(), budget);
        assert!(street.text.ends_with("..."));
    }

    #[test]
    fn disabled_barcode_draws_no_image() {
        let mut config = GenerationConfig::default();
        config.include_cepnet = false;
        let result = layout(LabelFormatId::ThermalLarge, &entries(1), &config);
        assert_eq!(result.pages[0].display_list.images().count(), 0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn barcode_failure_degrades_single_cell() {
        let mut config = GenerationConfig::default();
        config.dpi = 30;
        let result = layout(LabelFormatId::MultiUp6, &entries(3), &config);
        assert_eq!(result.summary.total_pages, 1);
        assert_eq!(result.warnings.len(), 3);
        assert!(result
            .warnings
            .iter()
            .all(|w| w.kind == WarningKind::BarcodeOmitted));
        // every cell still carries its four address lines
        assert_eq!(result.pages[0].display_list.texts().count(), 12);
    }

    #[test]
    fn thermal_large_sender_is_right_aligned_bottom_up() {
        let config = GenerationConfig::default();
        let sender = Sender::try_from(labelkit_address::SenderRecord {
            name: "Acme".into(),
            street: "Rua B".into(),
            number: "1".into(),
            complement: None,
            district: "Centro".into(),
            city: "Recife".into(),
            state: "PE".into(),
            cep: "50010-000".into(),
        })
        .unwrap();
        let options = LayoutOptions {
            include_sender: true,
            include_barcode: false,
            ..LayoutOptions::default()
        };
        let ctx = LayoutContext::new(&config, options).with_sender(Some(&sender));
        let result = paginator_for(&LabelFormatId::ThermalLarge.format()).paginate(&entries(1), &ctx);
        let sender_runs: Vec<&TextRun> = result.pages[0]
            .display_list
            .texts()
            .filter(|run| run.font_size_pt == 6.0)
            .collect();
        assert_eq!(sender_runs.len(), 4);
        // reversed: locality first at the bottom, "Rem:" last at the top
        assert_eq!(sender_runs[0].text, "50010-000 Recife/PE");
        assert_eq!(sender_runs[3].text, "Rem: Acme");
        assert!((sender_runs[0].position.y - mm(3.0)).abs() < 1e-3);
        assert!((sender_runs[3].position.y - (mm(3.0) + 24.0)).abs() < 1e-3);
        assert!(sender_runs.iter().all(|run| run.anchor == TextAnchor::End));
    }

    #[test]
    fn sender_is_ignored_without_request() {
        let config = GenerationConfig::default();
        let result = layout(LabelFormatId::EnvelopeSmall, &entries(1), &config);
        let list = &result.pages[0].display_list;
        assert!(list.texts().all(|run| !run.text.starts_with("Rem:")));
        assert!(!list
            .commands
            .iter()
            .any(|command| matches!(command, DisplayCommand::Line { .. })));
    }

    #[test]
    fn envelope_places_destination_and_postage_area() {
        let config = GenerationConfig::default();
        let result = layout(LabelFormatId::EnvelopeLarge, &entries(1), &config);
        let page = &result.pages[0];
        let (width, height) = PaperSize::new(229.0, 162.0).to_points();
        let first = page.display_list.texts().next().unwrap();
        assert!((first.position.x - width * 0.38).abs() < 1e-3);
        assert!((first.position.y - height * 0.55).abs() < 1e-3);
        assert_eq!(first.font_size_pt, 14.0);

        let postage = page
            .display_list
            .commands
            .iter()
            .find_map(|command| match command {
                DisplayCommand::Rect(rect) => Some(*rect),
                _ => None,
            })
            .unwrap();
        assert!(postage.dash.is_some());
        assert!((postage.origin.x + postage.size.width - (width - mm(10.0))).abs() < 1e-3);

        let bars = page.display_list.images().next().unwrap();
        // 4 lines of 17 pt below the first baseline, 15 mm drop, caption band
        let expected_y = height * 0.55 - 4.0 * 17.0 - mm(15.0) + 7.5;
        assert!((bars.origin.y - expected_y).abs() < 1e-3);
    }

    #[test]
    fn matrix_without_encoder_is_a_warning() {
        let mut config = GenerationConfig::default();
        config.include_datamatrix = true;
        let result = layout(LabelFormatId::ThermalLarge, &entries(1), &config);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::MatrixSymbolOmitted);
    }
}
