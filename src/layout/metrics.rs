//! Headless layout oracle backed by font metrics
//!
//! Estimates rendered heights without a browser: the fragment is parsed,
//! flattened into block-level line groups and each group is line-broken
//! against the content width. Good enough for previews, CLI output and
//! tests; the browser bridge should be preferred for exact breaks.

use crate::document::BlockKind;
use crate::error::Result;
use crate::layout::font::{FontId, FontLibrary, Typography};
use crate::layout::line_break::LineBreaker;
use crate::layout::oracle::LayoutOracle;
use rustc_hash::{FxHashMap, FxHasher};
use scraper::{ElementRef, Html, Node};
use std::hash::{Hash, Hasher};

/// Indentation of list items and block quotes
pub const LIST_INDENT: f32 = 40.0;

/// Vertical padding of a table row (top + bottom)
pub const CELL_PADDING: f32 = 8.0;

/// Elements whose content is never rendered
const HIDDEN: &[&str] = &["script", "style", "head", "title", "template", "noscript", "meta", "link"];

#[derive(Debug, Clone, Copy)]
struct Context {
    kind: BlockKind,
    indent: f32,
    preformatted: bool,
}

#[derive(Debug)]
enum LineGroup {
    Text {
        text: String,
        kind: BlockKind,
        indent: f32,
        preformatted: bool,
    },
    Row {
        cells: Vec<String>,
        indent: f32,
    },
    Fixed(f32),
    /// Block spacing in font-size units
    Spacing(f32),
}

/// Flattens a parsed fragment into line groups
#[derive(Default)]
struct Collector {
    groups: Vec<LineGroup>,
    buffer: String,
    image_height: f32,
    rule_height: f32,
}

impl Collector {
    fn walk(&mut self, element: ElementRef<'_>, ctx: Context) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text, ctx),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child, ctx);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>, ctx: Context) {
        let name = element.value().name();
        if HIDDEN.contains(&name) {
            return;
        }

        match name {
            "br" => {
                self.buffer.push('\n');
                return;
            }
            "img" | "svg" | "canvas" | "video" | "iframe" => {
                self.flush(ctx);
                let height = element
                    .value()
                    .attr("height")
                    .and_then(parse_px)
                    .unwrap_or(self.image_height);
                self.groups.push(LineGroup::Fixed(height));
                return;
            }
            "hr" => {
                self.flush(ctx);
                self.groups.push(LineGroup::Fixed(self.rule_height));
                return;
            }
            "tr" => {
                self.flush(ctx);
                let cells: Vec<String> = element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                    .map(|cell| collapse(&cell.text().collect::<String>()))
                    .collect();
                if !cells.is_empty() {
                    self.groups.push(LineGroup::Row {
                        cells,
                        indent: ctx.indent,
                    });
                }
                return;
            }
            _ => {}
        }

        if !BlockKind::is_block_tag(name) {
            self.walk(element, ctx);
            return;
        }

        self.flush(ctx);

        let kind = match BlockKind::from_tag(name) {
            BlockKind::Container | BlockKind::Other => ctx.kind,
            kind => kind,
        };
        let indent = match name {
            "ul" | "ol" | "menu" | "blockquote" | "dd" => ctx.indent + LIST_INDENT,
            _ => ctx.indent,
        };
        let inner = Context {
            kind,
            indent,
            preformatted: ctx.preformatted || name == "pre",
        };

        self.walk(element, inner);
        self.flush(inner);

        let spacing = BlockKind::from_tag(name).spacing_after();
        if spacing > 0.0 && name != "li" {
            self.groups.push(LineGroup::Spacing(spacing));
        }
    }

    fn push_text(&mut self, text: &str, ctx: Context) {
        if ctx.preformatted {
            self.buffer.push_str(text);
            return;
        }
        for ch in text.chars() {
            if ch.is_whitespace() {
                if !self.buffer.is_empty() && !self.buffer.ends_with(' ') && !self.buffer.ends_with('\n') {
                    self.buffer.push(' ');
                }
            } else {
                self.buffer.push(ch);
            }
        }
    }

    fn flush(&mut self, ctx: Context) {
        let text = std::mem::take(&mut self.buffer);
        let text = if ctx.preformatted {
            text.trim_end_matches('\n').to_string()
        } else {
            text.trim_end_matches(' ').to_string()
        };
        if text.is_empty() {
            return;
        }
        self.groups.push(LineGroup::Text {
            text,
            kind: ctx.kind,
            indent: ctx.indent,
            preformatted: ctx.preformatted,
        });
    }
}

/// Upper bound on cached measurements between two runs
pub const MAX_CACHED: usize = 4096;

type CacheKey = (u64, u32, u64);

/// Headless oracle estimating heights from font metrics.
///
/// Measurements are cached for the current run and the one before it;
/// entries not reused by a run are dropped when the next one prepares.
pub struct MetricsOracle {
    fonts: FontLibrary,
    line_breaker: LineBreaker,
    cache: FxHashMap<CacheKey, f32>,
    previous: FxHashMap<CacheKey, f32>,
}

impl Default for MetricsOracle {
    fn default() -> Self {
        Self::new(FontLibrary::default())
    }
}

impl MetricsOracle {
    pub fn new(fonts: FontLibrary) -> Self {
        Self {
            fonts,
            line_breaker: LineBreaker::new(),
            cache: FxHashMap::default(),
            previous: FxHashMap::default(),
        }
    }

    /// Mutable access to the font library; clears cached measurements
    pub fn fonts_mut(&mut self) -> &mut FontLibrary {
        self.cache.clear();
        self.previous.clear();
        &mut self.fonts
    }

    /// Number of cached measurements
    pub fn cached(&self) -> usize {
        self.cache.len() + self.previous.len()
    }

    fn estimate(&self, fragment: &str, width: f32, typography: &Typography) -> f32 {
        let html = Html::parse_fragment(fragment);
        let mut collector = Collector {
            image_height: typography.image_height,
            rule_height: typography.rule_height,
            ..Collector::default()
        };
        let root = Context {
            kind: BlockKind::Text,
            indent: 0.0,
            preformatted: false,
        };
        collector.walk(html.root_element(), root);
        collector.flush(root);

        let body_font = self.fonts.resolve(&typography.primary_family());
        let spacing_unit = typography.font_size * typography.paragraph_spacing;

        let mut height: f32 = 0.0;
        for group in &collector.groups {
            height += match group {
                LineGroup::Text {
                    text,
                    kind,
                    indent,
                    preformatted,
                } => {
                    let font = if *preformatted { FontId::MONOSPACE } else { body_font };
                    let scale = kind.font_scale();
                    let lines = self.line_breaker.layout_text(
                        text,
                        (width - indent).max(1.0),
                        self.fonts.metrics(font),
                        typography.font_size * scale,
                        !preformatted,
                    );
                    lines.len() as f32 * typography.line_px(scale)
                }
                LineGroup::Row { cells, indent } => {
                    let cell_width = ((width - indent) / cells.len() as f32).max(1.0);
                    let metrics = self.fonts.metrics(body_font);
                    let max_lines = cells
                        .iter()
                        .map(|cell| {
                            self.line_breaker
                                .layout_text(cell, cell_width, metrics, typography.font_size, true)
                                .len()
                                .max(1)
                        })
                        .max()
                        .unwrap_or(1);
                    max_lines as f32 * typography.line_px(1.0) + CELL_PADDING
                }
                LineGroup::Fixed(value) => *value,
                LineGroup::Spacing(em) => em * spacing_unit,
            };
        }

        // Trailing block spacing does not contribute to the box height
        if let Some(LineGroup::Spacing(em)) = collector.groups.last() {
            height -= em * spacing_unit;
        }

        height.max(0.0)
    }
}

impl LayoutOracle for MetricsOracle {
    fn prepare(&mut self, _width: f32, _typography: &Typography) -> Result<()> {
        self.previous = std::mem::take(&mut self.cache);
        Ok(())
    }

    fn measure(&mut self, fragment: &str, width: f32, typography: &Typography) -> Result<f32> {
        let key = (
            crate::document::hash_text(fragment),
            width.to_bits(),
            typography_key(typography),
        );
        if let Some(height) = self.cache.get(&key) {
            return Ok(*height);
        }
        let height = match self.previous.remove(&key) {
            Some(height) => height,
            None => self.estimate(fragment, width, typography),
        };
        if self.cache.len() >= MAX_CACHED {
            self.cache.clear();
        }
        self.cache.insert(key, height);
        Ok(height)
    }
}

fn typography_key(typography: &Typography) -> u64 {
    let mut hasher = FxHasher::default();
    typography.font_family.hash(&mut hasher);
    for value in [
        typography.font_size,
        typography.line_height,
        typography.paragraph_spacing,
        typography.image_height,
        typography.rule_height,
    ] {
        value.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Parse `120`, `120px` or `120.5` into pixels
fn parse_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
