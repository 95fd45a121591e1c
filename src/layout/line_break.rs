//! Line breaking algorithm

use crate::layout::font::FontMetrics;
use std::ops::Range;
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

/// Layout result for a single line
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    /// Byte range within the text this line covers
    pub byte_range: Range<usize>,
    /// Advance width of the line in pixels, trailing whitespace included
    pub width: f32,
}

/// Line breaker
#[derive(Debug, Default)]
pub struct LineBreaker;

impl LineBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Break `text` into lines no wider than `max_width`.
    ///
    /// Lines break at Unicode line-break opportunities; a word wider than
    /// the line is split at grapheme boundaries. `\n` always ends a line.
    /// With `wrap` off only `\n` breaks (pre-formatted text).
    /// Empty text produces no lines.
    pub fn layout_text(
        &self,
        text: &str,
        max_width: f32,
        metrics: &FontMetrics,
        font_size: f32,
        wrap: bool,
    ) -> Vec<LineLayout> {
        let mut lines = Vec::new();
        if text.is_empty() {
            return lines;
        }

        let mut line_start: usize = 0;
        let mut x: f32 = 0.0;
        let mut segment_start: usize = 0;

        for (idx, opportunity) in linebreaks(text) {
            let segment = &text[segment_start..idx];
            let visible = segment.trim_end();
            let visible_width = self.measure(visible, metrics, font_size);
            let full_width = self.measure(segment, metrics, font_size);

            if wrap && x > 0.0 && x + visible_width > max_width {
                lines.push(LineLayout {
                    byte_range: line_start..segment_start,
                    width: x,
                });
                line_start = segment_start;
                x = 0.0;
            }

            if wrap && visible_width > max_width {
                // Emergency break inside an over-long word
                for (offset, grapheme) in visible.grapheme_indices(true) {
                    let w = self.grapheme_width(grapheme, metrics, font_size);
                    if x > 0.0 && x + w > max_width {
                        lines.push(LineLayout {
                            byte_range: line_start..segment_start + offset,
                            width: x,
                        });
                        line_start = segment_start + offset;
                        x = 0.0;
                    }
                    x += w;
                }
                x += full_width - visible_width;
            } else {
                x += full_width;
            }

            if opportunity == BreakOpportunity::Mandatory && idx < text.len() {
                lines.push(LineLayout {
                    byte_range: line_start..idx,
                    width: x,
                });
                line_start = idx;
                x = 0.0;
            }

            segment_start = idx;
        }

        // Final line
        if line_start < text.len() || lines.is_empty() {
            lines.push(LineLayout {
                byte_range: line_start..text.len(),
                width: x,
            });
        }

        lines
    }

    /// Advance width of a run of text
    pub fn measure(&self, text: &str, metrics: &FontMetrics, font_size: f32) -> f32 {
        text.graphemes(true)
            .map(|g| self.grapheme_width(g, metrics, font_size))
            .sum()
    }

    fn grapheme_width(&self, grapheme: &str, metrics: &FontMetrics, font_size: f32) -> f32 {
        if grapheme == "\t" {
            return metrics.width(' ') * 4.0 * font_size;
        }
        match grapheme.chars().next() {
            Some(c) if !c.is_control() => metrics.width(c) * font_size,
            _ => 0.0,
        }
    }
}
