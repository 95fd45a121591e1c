//! Page geometry, measurement and pagination

pub mod font;
mod geometry;
mod line_break;
mod metrics;
pub mod oracle;
mod pagination;

pub use font::{FontId, FontLibrary, FontMetrics, Typography};
pub use geometry::{mm_to_px, Margins, Orientation, PageGeometry, PaperSize, CSS_DPI, MM_PER_INCH};
pub use line_break::{LineBreaker, LineLayout};
pub use metrics::{MetricsOracle, CELL_PADDING, LIST_INDENT, MAX_CACHED};
pub use oracle::{LayoutOracle, MeasureScope};
pub use pagination::{paginate, PaginationRun, HEIGHT_EPSILON};
