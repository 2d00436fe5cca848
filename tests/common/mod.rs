#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from panelscan for tests
pub use panelscan::{
    BoundingBox, Circle, KnobName, LabelStrategy, PanelDetector, PanelLayout, PanelReport,
    Region, RegionSource,
};

/// Detector with the calibrated default layout.
pub fn default_detector() -> PanelDetector {
    PanelDetector::new(PanelLayout::default()).expect("default layout is valid")
}

pub fn is_near(c: &Circle, x: u32, y: u32, tolerance: u32) -> bool {
    c.center_x.abs_diff(x) <= tolerance && c.center_y.abs_diff(y) <= tolerance
}
