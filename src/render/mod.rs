//! Render output: rendered pages, footers and the print document

mod footer;
mod page;
mod print;

pub use footer::{FooterSegment, FooterTemplate, FooterToken, DEFAULT_FOOTER};
pub use page::{PageSet, RenderedPage};
pub use print::{PrintDocument, PAGE_CLASS};
