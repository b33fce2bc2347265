use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use labelkit_address::Address;
use labelkit_barcode::MatrixSymbolEncoder;
use labelkit_settings::SharedGeneratorState;

use crate::error::LabelError;
use crate::format::LabelFormatId;
use crate::layout::{
    paginator_for, LabelEntry, LabelWarning, LayoutContext, LayoutOptions, PageLayout,
    PaginationResult,
};
use crate::pdf::render_pdf;
use crate::preview::{render_preview_png, PreviewEntry};

/// Opaque identifier for one generation call, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationId(u64);

impl GenerationId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generation-{}", self.0)
    }
}

/// A finished multi-page document plus everything that was degraded on the way.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub id: GenerationId,
    pub format: LabelFormatId,
    pub pdf: Vec<u8>,
    pub page_count: usize,
    pub label_count: usize,
    pub warnings: Vec<LabelWarning>,
    pub pages: Vec<PageLayout>,
}

impl GeneratedDocument {
    /// Rasterizes page `index` (0-based) for on-screen preview.
    pub fn preview(&self, index: usize, dpi: u32) -> Result<PreviewEntry, LabelError> {
        let page = self.pages.get(index).ok_or(LabelError::PageOutOfRange {
            page: index,
            pages: self.pages.len(),
        })?;
        render_preview_png(page, dpi)
    }
}

/// Turns label requests into PDF page streams.
///
/// Sender and config are read from [`SharedGeneratorState`] once per call; a
/// concurrent update is only visible to calls that start after it.
#[derive(Clone)]
pub struct LabelGenerator {
    state: Arc<SharedGeneratorState>,
    matrix_encoder: Option<Arc<dyn MatrixSymbolEncoder>>,
}

impl LabelGenerator {
    pub fn new(state: Arc<SharedGeneratorState>) -> Self {
        Self {
            state,
            matrix_encoder: None,
        }
    }

    pub fn with_matrix_encoder(mut self, encoder: Arc<dyn MatrixSymbolEncoder>) -> Self {
        self.matrix_encoder = Some(encoder);
        self
    }

    pub fn state(&self) -> &Arc<SharedGeneratorState> {
        &self.state
    }

    /// Single label for `address`. `name` is used when the address carries
    /// no recipient override.
    pub fn generate(
        &self,
        format_id: &str,
        name: &str,
        address: &Address,
        options: LayoutOptions,
    ) -> Result<GeneratedDocument, LabelError> {
        let entry = LabelEntry::new(name, address.clone());
        self.generate_batch(format_id, std::slice::from_ref(&entry), options)
    }

    /// All `entries` in one document. Multi-up formats fill sheets in
    /// row-major order; single-canvas formats emit one page per entry.
    pub fn generate_batch(
        &self,
        format_id: &str,
        entries: &[LabelEntry],
        options: LayoutOptions,
    ) -> Result<GeneratedDocument, LabelError> {
        let format = LabelFormatId::parse(format_id)?;
        let id = GenerationId::new();
        let layout = self.layout_parsed(format, entries, options)?;
        let pdf = render_pdf(&layout.pages)?;

        tracing::info!(
            generation = %id,
            format = %format,
            labels = layout.summary.total_labels,
            pages = layout.summary.total_pages,
            warnings = layout.warnings.len(),
            "label document generated"
        );

        Ok(GeneratedDocument {
            id,
            format,
            pdf,
            page_count: layout.pages.len(),
            label_count: layout.summary.total_labels,
            warnings: layout.warnings,
            pages: layout.pages,
        })
    }

    /// Runs only the layout pass and returns the display lists.
    pub fn layout(
        &self,
        format_id: &str,
        entries: &[LabelEntry],
        options: LayoutOptions,
    ) -> Result<PaginationResult, LabelError> {
        let format = LabelFormatId::parse(format_id)?;
        self.layout_parsed(format, entries, options)
    }

    fn layout_parsed(
        &self,
        format: LabelFormatId,
        entries: &[LabelEntry],
        options: LayoutOptions,
    ) -> Result<PaginationResult, LabelError> {
        if entries.is_empty() {
            return Err(LabelError::EmptyBatch);
        }
        let snapshot = self.state.snapshot();
        let ctx = LayoutContext::new(&snapshot.config, options)
            .with_sender(snapshot.sender.as_ref())
            .with_matrix_encoder(self.matrix_encoder.as_deref());
        let format = format.format();
        tracing::debug!(format = %format.id, labels = entries.len(), "laying out labels");
        Ok(paginator_for(&format).paginate(entries, &ctx))
    }
}

impl Default for LabelGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SharedGeneratorState::default()))
    }
}

impl fmt::Debug for LabelGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelGenerator")
            .field("state", &self.state)
            .field("matrix_encoder", &self.matrix_encoder.is_some())
            .finish()
    }
}
