//! Font metrics and typography for layout

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Typography rules applied to the measurement container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Typography {
    /// CSS font-family list; the first family selects metrics
    pub font_family: String,
    /// Base font size in CSS pixels
    pub font_size: f32,
    /// Line height as a multiple of the font size
    pub line_height: f32,
    /// Block spacing as a multiple of the font size
    pub paragraph_spacing: f32,
    /// Height assumed for images without an explicit height
    pub image_height: f32,
    /// Height of a horizontal rule including its margins
    pub rule_height: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: "Arial, Helvetica, sans-serif".to_string(),
            font_size: 14.0,
            line_height: 1.4,
            paragraph_spacing: 1.0,
            image_height: 150.0,
            rule_height: 17.0,
        }
    }
}

impl Typography {
    /// Line height in pixels for a font scale
    pub fn line_px(&self, scale: f32) -> f32 {
        self.font_size * scale * self.line_height
    }

    /// Inline CSS the host applies to its measurement container
    pub fn to_css(&self) -> String {
        format!(
            "font-family: {}; font-size: {}px; line-height: {}",
            self.font_family, self.font_size, self.line_height
        )
    }

    /// First family in the font-family list, unquoted and lowercase
    pub fn primary_family(&self) -> String {
        self.font_family
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .to_ascii_lowercase()
    }
}

/// Advance widths in em units (multiply by the font size)
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// Width of ASCII characters (0-127)
    pub char_widths: Vec<f32>,
    /// Default width for non-ASCII characters
    pub default_width: f32,
    /// Width for East Asian wide characters
    pub wide_width: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::proportional()
    }
}

impl FontMetrics {
    pub fn new(char_widths: Vec<f32>, default_width: f32) -> Self {
        Self {
            char_widths,
            default_width,
            wide_width: 1.0,
        }
    }

    /// Approximate metrics of a Helvetica-like sans-serif
    pub fn proportional() -> Self {
        let char_widths = (0u8..128)
            .map(|b| match b {
                b' ' | b'.' | b',' | b':' | b';' | b'\'' | b'!' | b'|' => 0.278,
                b'i' | b'j' | b'l' => 0.222,
                b'f' | b't' | b'r' | b'I' | b'(' | b')' | b'[' | b']' | b'-' => 0.333,
                b'm' => 0.833,
                b'w' => 0.722,
                b'M' => 0.833,
                b'W' => 0.944,
                b'0'..=b'9' => 0.556,
                b'A'..=b'Z' => 0.667,
                b'a'..=b'z' => 0.556,
                0..=31 | 127 => 0.0,
                _ => 0.584,
            })
            .collect();
        Self::new(char_widths, 0.556)
    }

    /// Fixed-pitch metrics
    pub fn monospace() -> Self {
        let char_widths = (0u8..128)
            .map(|b| if b < 32 || b == 127 { 0.0 } else { 0.6 })
            .collect();
        Self::new(char_widths, 0.6)
    }

    /// Get width of a character in em
    pub fn width(&self, c: char) -> f32 {
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        if is_wide(c) {
            self.wide_width
        } else {
            self.default_width
        }
    }
}

/// East Asian wide ranges (CJK, Hangul, fullwidth forms)
fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1FAFF)
}

/// Unique identifier for a loaded font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub u32);

impl FontId {
    /// Default proportional font
    pub const DEFAULT: FontId = FontId(0);
    /// Fixed-pitch font used for pre-formatted text
    pub const MONOSPACE: FontId = FontId(1);
}

/// Library of loaded fonts
#[derive(Debug, Clone)]
pub struct FontLibrary {
    fonts: FxHashMap<FontId, FontMetrics>,
    families: FxHashMap<String, FontId>,
    next_id: u32,
}

impl Default for FontLibrary {
    fn default() -> Self {
        let mut fonts = FxHashMap::default();
        fonts.insert(FontId::DEFAULT, FontMetrics::proportional());
        fonts.insert(FontId::MONOSPACE, FontMetrics::monospace());

        let mut families = FxHashMap::default();
        for family in ["monospace", "courier", "courier new", "consolas", "menlo"] {
            families.insert(family.to_string(), FontId::MONOSPACE);
        }

        Self {
            fonts,
            families,
            next_id: 2,
        }
    }
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new font for a family name and return its ID
    pub fn add(&mut self, family: &str, metrics: FontMetrics) -> FontId {
        let id = FontId(self.next_id);
        self.next_id += 1;
        self.fonts.insert(id, metrics);
        self.families.insert(family.to_ascii_lowercase(), id);
        id
    }

    /// Set font metrics for a specific ID
    pub fn set(&mut self, id: FontId, metrics: FontMetrics) {
        self.fonts.insert(id, metrics);
    }

    /// Get font metrics by ID
    pub fn get(&self, id: FontId) -> Option<&FontMetrics> {
        self.fonts.get(&id)
    }

    /// Resolve a family name, falling back to the default font
    pub fn resolve(&self, family: &str) -> FontId {
        self.families
            .get(&family.to_ascii_lowercase())
            .copied()
            .unwrap_or(FontId::DEFAULT)
    }

    /// Metrics for `id`, or the default font when unknown
    pub fn metrics(&self, id: FontId) -> &FontMetrics {
        self.fonts
            .get(&id)
            .or_else(|| self.fonts.get(&FontId::DEFAULT))
            .unwrap_or(&FALLBACK_METRICS)
    }
}

static FALLBACK_METRICS: FontMetrics = FontMetrics {
    char_widths: Vec::new(),
    default_width: 0.556,
    wide_width: 1.0,
};
