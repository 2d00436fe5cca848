use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::{PanelError, Result};
use crate::models::{BoundingBox, Region};
use crate::report::PanelReport;

const KNOB_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const UNKNOWN_COLOR: Rgb<u8> = Rgb([255, 160, 0]);
const REGION_COLOR: Rgb<u8> = Rgb([80, 80, 255]);
const LABEL_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const METER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Directory receiving intermediate images of a detection run.
#[derive(Clone, Debug)]
pub struct DebugConfig {
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(PanelError::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }
        Ok(Self { output_dir })
    }

    /// Save one stage as `NN_<stage>.png`.
    pub fn save_stage(&self, index: usize, stage: &str, image: &DynamicImage) -> Result<PathBuf> {
        let filename = format!("{:02}_{}.png", index, stage.to_lowercase().replace(' ', "_"));
        let path = self.output_dir.join(filename);
        save(image, &path)?;
        debug!("Debug: saved {}", path.display());
        Ok(path)
    }
}

fn save(image: &DynamicImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|source| PanelError::DebugImage {
        path: path.to_path_buf(),
        source,
    })
}

fn rect_of_box(b: &BoundingBox) -> Option<Rect> {
    (b.width > 0 && b.height > 0)
        .then(|| Rect::at(b.x as i32, b.y as i32).of_size(b.width, b.height))
}

fn rect_of_region(r: &Region) -> Option<Rect> {
    (!r.is_empty()).then(|| Rect::at(r.x1 as i32, r.y1 as i32).of_size(r.width(), r.height()))
}

/// Draw every detection over the input image.
pub fn draw_overlay(input: &DynamicImage, report: &PanelReport) -> RgbImage {
    let mut canvas = input.to_rgb8();

    for k in &report.knobs {
        let c = &k.circle;
        let color = if k.name.is_some() { KNOB_COLOR } else { UNKNOWN_COLOR };
        draw_hollow_circle_mut(
            &mut canvas,
            (c.center_x as i32, c.center_y as i32),
            c.radius as i32,
            color,
        );
    }

    for l in &report.labels {
        if let Some(rect) = rect_of_region(&l.region) {
            draw_hollow_rect_mut(&mut canvas, rect, REGION_COLOR);
        }
        if let Some(rect) = l.bbox.as_ref().and_then(rect_of_box) {
            draw_hollow_rect_mut(&mut canvas, rect, LABEL_COLOR);
        }
    }

    for m in &report.meters {
        if let Some(rect) = rect_of_box(&m.bbox) {
            draw_hollow_rect_mut(&mut canvas, rect, METER_COLOR);
        }
    }

    canvas
}
