//! Panel layout configuration.
//!
//! Every threshold, search window and naming rule used by the detector lives
//! here. [`PanelLayout::default`] holds the values calibrated against the
//! reference compressor panel; a JSON file can override any subset.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::detection::circles::{HoughConfig, KnobFilter};
use crate::detection::classify::{KnobAnchor, KnobRules, MeterRule};
use crate::detection::contours::SizeFilter;
use crate::detection::preprocessing::PreprocessConfig;
use crate::error::{PanelError, Result};
use crate::models::{KnobName, Region};

/// How label search windows are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStrategy {
    /// Always use the calibrated rectangles.
    Fixed,
    /// Place the window under the detected knob of the same name, falling
    /// back to the calibrated rectangle when that knob was not found.
    KnobRelative,
}

/// Where to look for one knob's caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSearch {
    pub name: KnobName,
    pub fixed: Region,
    pub anchor: KnobAnchor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Binarization cutoff for printed text.
    pub cutoff: u8,
    pub min_component: SizeFilter,
    pub strategy: LabelStrategy,
    pub searches: Vec<LabelSearch>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        use KnobName::*;
        let search = |name,
                      (x1, x2, y1, y2): (u32, u32, u32, u32),
                      (dx_min, dx_max, dy_from_rim, height): (i32, i32, i32, u32)| LabelSearch {
            name,
            fixed: Region { x1, x2, y1, y2 },
            anchor: KnobAnchor {
                dx_min,
                dx_max,
                dy_from_rim,
                height,
            },
        };
        Self {
            cutoff: 100,
            min_component: SizeFilter::default(),
            strategy: LabelStrategy::KnobRelative,
            searches: vec![
                search(Threshold, (150, 260, 520, 600), (-56, 54, 1, 80)),
                search(Ratio, (480, 544, 400, 450), (-32, 32, 2, 50)),
                search(Attack, (380, 440, 510, 560), (-30, 30, -3, 50)),
                search(Release, (580, 640, 510, 560), (-34, 26, -3, 50)),
                search(Gain, (760, 870, 520, 600), (-58, 52, 1, 80)),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Complete detector configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelLayout {
    /// Resolution the fixed regions were calibrated at, if known.
    pub reference_resolution: Option<Resolution>,
    pub preprocess: PreprocessConfig,
    pub hough: HoughConfig,
    pub knob_filter: KnobFilter,
    pub knob_rules: KnobRules,
    pub labels: LabelConfig,
    pub meter: MeterRule,
    /// Minimum size of dark components considered as meter candidates.
    pub meter_component: SizeFilter,
}

impl PanelLayout {
    /// Load a layout from JSON. Missing sections keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PanelError::LayoutRead {
            path: path.to_path_buf(),
            source,
        })?;
        let layout: PanelLayout =
            serde_json::from_str(&text).map_err(|source| PanelError::LayoutParse {
                path: path.to_path_buf(),
                source,
            })?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(PanelError::InvalidLayout(msg)) };

        let aperture = self.preprocess.median_aperture;
        if aperture == 0 || aperture % 2 == 0 {
            return invalid(format!("median aperture must be odd, got {aperture}"));
        }
        let h = &self.hough;
        if !(h.dp >= 1.0) {
            return invalid(format!("hough dp must be >= 1, got {}", h.dp));
        }
        if h.min_radius > h.max_radius {
            return invalid(format!(
                "hough radius range is empty: {}..{}",
                h.min_radius, h.max_radius
            ));
        }
        if h.param2 == 0 {
            return invalid("hough param2 must be positive".to_string());
        }
        if !(h.min_coverage > 0.0 && h.min_coverage <= 1.0) {
            return invalid(format!(
                "hough min_coverage must be within (0, 1], got {}",
                h.min_coverage
            ));
        }
        if !(0.0..=1.0).contains(&self.knob_filter.top_exclusion_fraction) {
            return invalid(format!(
                "top exclusion fraction must be within [0, 1], got {}",
                self.knob_filter.top_exclusion_fraction
            ));
        }
        for s in &self.labels.searches {
            if s.fixed.is_empty() {
                return invalid(format!("label region for {} is empty: {}", s.name, s.fixed));
            }
            if s.anchor.dx_min >= s.anchor.dx_max || s.anchor.height == 0 {
                return invalid(format!("label anchor for {} is empty", s.name));
            }
        }
        Ok(())
    }
}
