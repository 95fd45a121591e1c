//! Pagination configuration loaded from JSON

use crate::error::{ConfigError, Result};
use crate::layout::{Margins, Orientation, PageGeometry, PaperSize, Typography, CSS_DPI};
use crate::render::{FooterTemplate, DEFAULT_FOOTER};
use serde::{Deserialize, Serialize};

/// Default settle delay before re-paginating after an edit
pub const DEFAULT_SETTLE_MS: u64 = 300;

/// Everything a host configures about print pagination.
///
/// Lengths are in millimetres except `dpi`. Missing fields take defaults:
/// A4 portrait, 20mm margins, a 10mm footer band at 96 dpi.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationConfig {
    pub paper: PaperSize,
    pub orientation: Orientation,
    pub dpi: f32,
    pub margins: Margins,
    pub footer_height: f32,
    pub footer: String,
    pub typography: Typography,
    pub settle_ms: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            dpi: CSS_DPI,
            margins: Margins::default(),
            footer_height: 10.0,
            footer: DEFAULT_FOOTER.to_string(),
            typography: Typography::default(),
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

impl PaginationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.check()?;
        Ok(config)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Build and validate the page geometry in CSS pixels
    pub fn geometry(&self) -> Result<PageGeometry> {
        let geometry = PageGeometry::from_paper(
            self.paper,
            self.orientation,
            self.margins,
            self.footer_height,
            self.dpi,
        );
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn footer_template(&self) -> Result<FooterTemplate> {
        Ok(FooterTemplate::parse(&self.footer)?)
    }

    fn check(&self) -> Result<()> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(ConfigError::Unsupported {
                field: "dpi",
                value: self.dpi.to_string(),
            }
            .into());
        }
        if !(self.typography.font_size.is_finite() && self.typography.font_size > 0.0) {
            return Err(ConfigError::Unsupported {
                field: "typography.fontSize",
                value: self.typography.font_size.to_string(),
            }
            .into());
        }
        if let PaperSize::Custom {
            width_mm,
            height_mm,
        } = self.paper
        {
            if width_mm <= 0.0 || height_mm <= 0.0 {
                return Err(ConfigError::Unsupported {
                    field: "paper",
                    value: format!("{}mm x {}mm", width_mm, height_mm),
                }
                .into());
            }
        }
        Ok(())
    }
}
