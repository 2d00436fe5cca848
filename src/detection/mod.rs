pub mod preprocessing;
pub mod circles;
pub mod threshold;
pub mod contours;
pub mod classify;

use image::{DynamicImage, GrayImage};
use log::{debug, info, warn};
use std::path::PathBuf;

use crate::debug::{DebugConfig, draw_overlay};
use crate::error::Result;
use crate::layout::{LabelSearch, LabelStrategy, PanelLayout};
use crate::models::{Circle, Region};
use crate::report::{KnobDetection, LabelDetection, PanelReport, RegionSource};

/// Runs the full panel analysis on one image.
pub struct PanelDetector {
    layout: PanelLayout,
    debug: Option<DebugConfig>,
}

impl PanelDetector {
    pub fn new(layout: PanelLayout) -> Result<Self> {
        layout.validate()?;
        Ok(Self {
            layout,
            debug: None,
        })
    }

    /// Save intermediate images into `output_dir` (must be empty or absent).
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.debug = Some(DebugConfig::new(output_dir)?);
        Ok(self)
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    fn save_stage(
        &self,
        index: usize,
        stage: &str,
        image: impl FnOnce() -> DynamicImage,
    ) -> Result<()> {
        if let Some(debug) = &self.debug {
            debug.save_stage(index, stage, &image())?;
        }
        Ok(())
    }

    /// Run every stage and collect the classified result.
    pub fn detect(&self, img: &DynamicImage) -> Result<PanelReport> {
        let (width, height) = (img.width(), img.height());
        info!("Analyzing {}x{} image", width, height);
        if let Some(reference) = self.layout.reference_resolution {
            if (reference.width, reference.height) != (width, height) {
                warn!(
                    "Image is {}x{} but regions were calibrated at {}x{}",
                    width, height, reference.width, reference.height
                );
            }
        }
        self.save_stage(0, "input", || img.clone())?;

        debug!("Converting to grayscale...");
        let gray = preprocessing::to_grayscale(img);
        self.save_stage(1, "grayscale", || DynamicImage::ImageLuma8(gray.clone()))?;

        debug!("Applying median blur...");
        let blurred = preprocessing::apply_median(&gray, self.layout.preprocess.median_aperture);
        self.save_stage(2, "median_blur", || DynamicImage::ImageLuma8(blurred.clone()))?;
        self.save_stage(3, "edges", || {
            let p1 = self.layout.hough.param1;
            DynamicImage::ImageLuma8(imageproc::edges::canny(&blurred, (p1 / 2.0).max(1.0), p1))
        })?;

        let knobs = self.detect_knobs(&blurred, width);
        info!("Found {} knob candidates", knobs.len());

        let label_binary = threshold::binarize_dark(&gray, self.layout.labels.cutoff);
        self.save_stage(4, "label_threshold", || DynamicImage::ImageLuma8(label_binary.clone()))?;
        let labels = self.detect_labels(&label_binary, &knobs);
        info!(
            "Found {} of {} labels",
            labels.iter().filter(|l| l.bbox.is_some()).count(),
            labels.len()
        );

        let meter_binary = threshold::binarize_dark(&gray, self.layout.meter.cutoff);
        self.save_stage(5, "meter_threshold", || DynamicImage::ImageLuma8(meter_binary.clone()))?;
        let boxes = contours::find_boxes(&meter_binary, &self.layout.meter_component);
        let meters = classify::rank_meters(&boxes, &self.layout.meter, width, height);
        info!("Found {} meter candidates from {} dark regions", meters.len(), boxes.len());
        if meters.len() > 1 {
            warn!("{} boxes qualify as the meter, reporting all", meters.len());
        }

        let report = PanelReport {
            image_width: width,
            image_height: height,
            knobs,
            labels,
            meters,
        };
        self.save_stage(6, "overlay", || DynamicImage::ImageRgb8(draw_overlay(img, &report)))?;
        Ok(report)
    }

    fn detect_knobs(&self, blurred: &GrayImage, width: u32) -> Vec<KnobDetection> {
        let candidates =
            circles::find_knob_candidates(blurred, &self.layout.hough, &self.layout.knob_filter);
        candidates
            .into_iter()
            .map(|circle| {
                let name = self.layout.knob_rules.classify_circle(&circle, width);
                if name.is_none() {
                    warn!(
                        "Unclassified knob at ({}, {}) d={}; check the rule bands",
                        circle.center_x,
                        circle.center_y,
                        circle.diameter()
                    );
                }
                KnobDetection { circle, name }
            })
            .collect()
    }

    fn detect_labels(&self, binary: &GrayImage, knobs: &[KnobDetection]) -> Vec<LabelDetection> {
        let config = &self.layout.labels;
        config
            .searches
            .iter()
            .map(|search| {
                let (region, source) =
                    self.label_region(search, knobs, binary.width(), binary.height());
                let bbox = contours::union_in_region(binary, &region, &config.min_component);
                if bbox.is_none() {
                    warn!("No label found for {} in {}", search.name, region);
                }
                LabelDetection {
                    name: search.name,
                    region,
                    source,
                    bbox,
                }
            })
            .collect()
    }

    /// Search window for one label, clipped to the image.
    ///
    /// A knob-derived window that falls entirely outside the image is
    /// treated like a missing knob.
    fn label_region(
        &self,
        search: &LabelSearch,
        knobs: &[KnobDetection],
        width: u32,
        height: u32,
    ) -> (Region, RegionSource) {
        if self.layout.labels.strategy == LabelStrategy::KnobRelative {
            let named: Vec<&Circle> = knobs
                .iter()
                .filter(|k| k.name == Some(search.name))
                .map(|k| &k.circle)
                .collect();
            if let Some(knob) = classify::nearest_knob(&named, &search.fixed) {
                let derived = search.anchor.region_for(knob);
                match derived.clamp_to(width, height) {
                    Some(region) => return (region, RegionSource::Knob),
                    None => warn!(
                        "{} window {} under knob at ({}, {}) is outside the image",
                        search.name, derived, knob.center_x, knob.center_y
                    ),
                }
            }
        }
        let fixed = search.fixed;
        (fixed.clamp_to(width, height).unwrap_or(fixed), RegionSource::Calibrated)
    }
}
