//! print-pager: print pagination for document previews
//!
//! This crate splits HTML-like content into fixed-size printable pages:
//! - Manual break markers (comments, classes, attributes) are hard boundaries
//! - Sections taller than a page are packed greedily, block by block
//! - Heights come from a pluggable [`LayoutOracle`] (browser DOM, headless
//!   metrics, or a test stub)
//! - Pages are rendered with footers into one print-ready document

pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod render;
pub mod session;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use config::PaginationConfig;
pub use document::{Block, BlockKind, ContentDocument, ManualSection};
pub use error::{ConfigError, PaginationError, Result, TemplateError};
pub use layout::{
    paginate, LayoutOracle, Margins, MeasureScope, MetricsOracle, Orientation, PageGeometry,
    PaginationRun, PaperSize, Typography,
};
pub use render::{FooterTemplate, PageSet, PrintDocument, RenderedPage};
pub use session::{Change, Completion, Debouncer, PreviewSession, Ticket};

/// Paginate markup in one call
pub fn paginate_markup<O: LayoutOracle + ?Sized>(
    markup: &str,
    geometry: &PageGeometry,
    typography: &Typography,
    oracle: &mut O,
) -> Result<PageSet> {
    let document = ContentDocument::parse(markup);
    paginate(&document, geometry, typography, oracle)
}
