//! WASM bindings for the preview surface

pub mod flat_buffer;

use crate::config::PaginationConfig;
use crate::document::ContentDocument;
use crate::error::{PaginationError, Result};
use crate::layout::{LayoutOracle, MetricsOracle, PageGeometry, Typography};
use crate::render::{FooterTemplate, PageSet, PrintDocument};
use crate::session::{Change, Debouncer, PreviewSession};
use flat_buffer::PageBuffer;
use js_sys::Function;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js(err: PaginationError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Layout oracle backed by host callbacks.
///
/// `measure(fragment, width, css)` must return the rendered height in CSS
/// pixels. `prepare(width, css)` and `release()` are optional hooks for
/// creating and removing an off-screen container.
pub struct JsLayoutOracle<'a> {
    measure: &'a Function,
    prepare: Option<&'a Function>,
    release: Option<&'a Function>,
    css: String,
}

impl<'a> JsLayoutOracle<'a> {
    pub fn new(
        measure: &'a Function,
        prepare: Option<&'a Function>,
        release: Option<&'a Function>,
    ) -> Self {
        Self {
            measure,
            prepare,
            release,
            css: String::new(),
        }
    }
}

impl LayoutOracle for JsLayoutOracle<'_> {
    fn prepare(&mut self, width: f32, typography: &Typography) -> Result<()> {
        self.css = typography.to_css();
        if let Some(prepare) = self.prepare {
            prepare
                .call2(
                    &JsValue::NULL,
                    &JsValue::from_f64(width as f64),
                    &JsValue::from_str(&self.css),
                )
                .map_err(|e| PaginationError::measurement(0, describe(&e)))?;
        }
        Ok(())
    }

    fn measure(&mut self, fragment: &str, width: f32, _typography: &Typography) -> Result<f32> {
        let value = self
            .measure
            .call3(
                &JsValue::NULL,
                &JsValue::from_str(fragment),
                &JsValue::from_f64(width as f64),
                &JsValue::from_str(&self.css),
            )
            .map_err(|e| PaginationError::measurement(0, describe(&e)))?;

        value
            .as_f64()
            .map(|h| h as f32)
            .ok_or_else(|| {
                PaginationError::measurement(0, format!("expected a number, got {}", describe(&value)))
            })
    }

    fn release(&mut self) {
        if let Some(release) = self.release {
            if let Err(e) = release.call0(&JsValue::NULL) {
                log::warn!("release callback failed: {}", describe(&e));
            }
        }
    }
}

/// WASM-exposed paginator wrapper
#[wasm_bindgen]
pub struct WasmPaginator {
    session: PreviewSession,
    debouncer: Debouncer,
    headless: MetricsOracle,
    buffer: PageBuffer,
    page_size: String,
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create a paginator from a JSON configuration
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> std::result::Result<WasmPaginator, JsValue> {
        let config = PaginationConfig::from_json(config_json).map_err(to_js)?;
        let session = PreviewSession::from_config(&config).map_err(to_js)?;

        Ok(Self {
            session,
            debouncer: Debouncer::new(config.settle_ms),
            headless: MetricsOracle::default(),
            buffer: PageBuffer::new(),
            page_size: config.paper.css_size(config.orientation),
        })
    }

    /// A4 portrait with default margins and footer
    pub fn a4() -> WasmPaginator {
        let config = PaginationConfig::default();
        Self {
            session: PreviewSession::new(PageGeometry::default(), config.typography.clone()),
            debouncer: Debouncer::new(config.settle_ms),
            headless: MetricsOracle::default(),
            buffer: PageBuffer::new(),
            page_size: config.paper.css_size(config.orientation),
        }
    }

    /// Paginate `content` measuring through host callbacks. Starts a new
    /// generation and returns it.
    pub fn paginate(
        &mut self,
        content: &str,
        measure: &Function,
        prepare: Option<Function>,
        release: Option<Function>,
    ) -> std::result::Result<f64, JsValue> {
        let document = ContentDocument::parse(content);
        self.session.invalidate(Change::Content);
        let mut oracle = JsLayoutOracle::new(measure, prepare.as_ref(), release.as_ref());
        self.session.refresh(&document, &mut oracle).map_err(to_js)?;
        Ok(self.session.generation() as f64)
    }

    /// Paginate with the built-in metrics estimator instead of the host
    #[wasm_bindgen(js_name = paginateHeadless)]
    pub fn paginate_headless(&mut self, content: &str) -> std::result::Result<usize, JsValue> {
        let document = ContentDocument::parse(content);
        self.session.invalidate(Change::Content);
        let set = self
            .session
            .refresh(&document, &mut self.headless)
            .map_err(to_js)?;
        Ok(set.total_pages())
    }

    /// Signal that content or geometry changed; returns the new generation
    pub fn invalidate(&mut self) -> f64 {
        self.session.invalidate(Change::Content).generation() as f64
    }

    /// Record an edit at `now` (milliseconds) for the settle delay
    #[wasm_bindgen(js_name = noteEdit)]
    pub fn note_edit(&mut self, now: f64) {
        self.session.invalidate(Change::Content);
        self.debouncer.poke(now.max(0.0) as u64);
    }

    /// Whether the settle delay has elapsed; consumes the pending edit
    #[wasm_bindgen(js_name = shouldRepaginate)]
    pub fn should_repaginate(&mut self, now: f64) -> bool {
        self.debouncer.take(now.max(0.0) as u64)
    }

    #[wasm_bindgen(js_name = isDirty)]
    pub fn is_dirty(&self) -> bool {
        self.session.is_dirty()
    }

    #[wasm_bindgen(js_name = setFooter)]
    pub fn set_footer(&mut self, template: &str) -> std::result::Result<(), JsValue> {
        let footer = FooterTemplate::parse(template).map_err(|e| to_js(e.into()))?;
        self.session.set_footer(footer);
        Ok(())
    }

    /// Get page count (0 before the first pagination)
    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.session.pages().map_or(0, PageSet::total_pages)
    }

    /// Footer text for a 1-based page
    pub fn footer(&self, index: usize) -> Option<String> {
        let pages = self.session.pages()?;
        pages.get(index)?;
        Some(pages.footer(self.session.footer(), index))
    }

    /// Pages and geometry as JSON
    #[wasm_bindgen(js_name = pagesJson)]
    pub fn pages_json(&self) -> std::result::Result<String, JsValue> {
        self.current()?
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Print-ready HTML for the current pages
    #[wasm_bindgen(js_name = printHtml)]
    pub fn print_html(&self) -> std::result::Result<String, JsValue> {
        let pages = self.current()?;
        Ok(PrintDocument::new(pages, self.session.footer())
            .typography(self.session.typography())
            .page_size(self.page_size.as_str())
            .render())
    }

    #[wasm_bindgen(js_name = geometryJson)]
    pub fn geometry_json(&self) -> std::result::Result<String, JsValue> {
        serde_json::to_string(self.session.geometry()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Fill the flat page buffer; JS then reads it through the pointer accessors
    #[wasm_bindgen(js_name = renderBuffer)]
    pub fn render_buffer(&mut self) -> bool {
        match self.session.pages() {
            Some(pages) => {
                self.buffer.write(pages, self.session.generation());
                true
            }
            None => {
                self.buffer.clear();
                false
            }
        }
    }

    #[wasm_bindgen(js_name = bufferU32Ptr)]
    pub fn buffer_u32_ptr(&self) -> u32 {
        self.buffer.u32_ptr()
    }

    #[wasm_bindgen(js_name = bufferU32Len)]
    pub fn buffer_u32_len(&self) -> u32 {
        self.buffer.u32_len()
    }

    #[wasm_bindgen(js_name = bufferF32Ptr)]
    pub fn buffer_f32_ptr(&self) -> u32 {
        self.buffer.f32_ptr()
    }

    #[wasm_bindgen(js_name = bufferF32Len)]
    pub fn buffer_f32_len(&self) -> u32 {
        self.buffer.f32_len()
    }

    #[wasm_bindgen(js_name = bufferTextPtr)]
    pub fn buffer_text_ptr(&self) -> u32 {
        self.buffer.text_ptr()
    }

    #[wasm_bindgen(js_name = bufferTextLen)]
    pub fn buffer_text_len(&self) -> u32 {
        self.buffer.text_len()
    }
}

impl WasmPaginator {
    fn current(&self) -> std::result::Result<&PageSet, JsValue> {
        self.session
            .pages()
            .ok_or_else(|| JsValue::from_str("no pages: call paginate first"))
    }
}

impl Default for WasmPaginator {
    fn default() -> Self {
        Self::a4()
    }
}
