//! Page geometry: paper sizes, margins and the available content area

use crate::error::{PaginationError, Result};
use serde::{Deserialize, Serialize};

/// Millimetres per inch
pub const MM_PER_INCH: f32 = 25.4;

/// CSS reference resolution
pub const CSS_DPI: f32 = 96.0;

/// Standard paper sizes, in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    #[serde(rename_all = "camelCase")]
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Portrait (width, height) in millimetres
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match *self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// CSS `@page size` keyword or explicit dimensions
    pub fn css_size(&self, orientation: Orientation) -> String {
        let keyword = match self {
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
            PaperSize::Custom { .. } => {
                let (w, h) = orientation.apply(self.dimensions_mm());
                return format!("{}mm {}mm", w, h);
            }
        };
        match orientation {
            Orientation::Portrait => format!("{} portrait", keyword),
            Orientation::Landscape => format!("{} landscape", keyword),
        }
    }
}

/// Orientation of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    fn apply(self, (w, h): (f32, f32)) -> (f32, f32) {
        match self {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Margin values for the four sides
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub const fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub const fn zero() -> Self {
        Self::uniform(0.0)
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(20.0)
    }
}

/// Convert millimetres to CSS pixels at `dpi`
pub fn mm_to_px(mm: f32, dpi: f32) -> f32 {
    mm / MM_PER_INCH * dpi
}

/// Fixed page geometry in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Height reserved at the bottom of the content area for the footer
    pub footer_height: f32,
    pub dpi: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::from_paper(
            PaperSize::A4,
            Orientation::Portrait,
            Margins::default(),
            10.0,
            CSS_DPI,
        )
    }
}

impl PageGeometry {
    /// Build a geometry from a paper size; margins and footer in millimetres
    pub fn from_paper(
        paper: PaperSize,
        orientation: Orientation,
        margins_mm: Margins,
        footer_mm: f32,
        dpi: f32,
    ) -> Self {
        let (width_mm, height_mm) = orientation.apply(paper.dimensions_mm());
        Self {
            page_width: mm_to_px(width_mm, dpi),
            page_height: mm_to_px(height_mm, dpi),
            margin_top: mm_to_px(margins_mm.top, dpi),
            margin_bottom: mm_to_px(margins_mm.bottom, dpi),
            margin_left: mm_to_px(margins_mm.left, dpi),
            margin_right: mm_to_px(margins_mm.right, dpi),
            footer_height: mm_to_px(footer_mm, dpi),
            dpi,
        }
    }

    /// Get usable content width
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Get usable content height per page (after margins and footer)
    pub fn content_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom - self.footer_height
    }

    /// Reject geometry that leaves no content area. Never clamps.
    pub fn validate(&self) -> Result<()> {
        let dims = [
            ("page width", self.page_width),
            ("page height", self.page_height),
            ("dpi", self.dpi),
        ];
        for (name, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                return Err(PaginationError::InvalidGeometry(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let insets = [
            ("top margin", self.margin_top),
            ("bottom margin", self.margin_bottom),
            ("left margin", self.margin_left),
            ("right margin", self.margin_right),
            ("footer height", self.footer_height),
        ];
        for (name, value) in insets {
            if !value.is_finite() || value < 0.0 {
                return Err(PaginationError::InvalidGeometry(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        if self.content_width() <= 0.0 {
            return Err(PaginationError::InvalidGeometry(format!(
                "horizontal margins ({} + {}) leave no room in page width {}",
                self.margin_left, self.margin_right, self.page_width
            )));
        }

        if self.content_height() <= 0.0 {
            return Err(PaginationError::InvalidGeometry(format!(
                "vertical margins and footer ({} + {} + {}) leave no room in page height {}",
                self.margin_top, self.margin_bottom, self.footer_height, self.page_height
            )));
        }

        Ok(())
    }
}
