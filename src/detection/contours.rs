use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{BoundingBox, Contour, Region};

/// Components must be strictly larger than this in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeFilter {
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for SizeFilter {
    fn default() -> Self {
        Self {
            min_width: 5,
            min_height: 5,
        }
    }
}

impl SizeFilter {
    pub fn accepts(&self, bbox: &BoundingBox) -> bool {
        bbox.width > self.min_width && bbox.height > self.min_height
    }
}

/// Find connected foreground components in a binary image
pub fn find_contours(binary: &GrayImage) -> Vec<Contour> {
    // Label connected components (non-zero pixels = foreground)
    let labeled = connected_components(binary, Connectivity::Eight, Luma([0]));

    let mut regions: HashMap<u32, (u32, u32, u32, u32, u32)> = HashMap::new();

    for (x, y, label) in labeled.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }

        regions
            .entry(label_val)
            .and_modify(|(min_x, min_y, max_x, max_y, count)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
                *count += 1;
            })
            .or_insert((x, y, x, y, 1));
    }

    let mut contours: Vec<Contour> = regions
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, count))| Contour {
            label,
            min_x,
            min_y,
            max_x,
            max_y,
            pixel_count: count,
        })
        .collect();
    // HashMap order is arbitrary
    contours.sort_by_key(|c| (c.min_y, c.min_x, c.label));
    contours
}

/// Bounding boxes of all components passing `filter`, over the whole image.
pub fn find_boxes(binary: &GrayImage, filter: &SizeFilter) -> Vec<BoundingBox> {
    find_contours(binary)
        .iter()
        .map(Contour::bounding_box)
        .filter(|b| filter.accepts(b))
        .collect()
}

/// Bounding boxes of components inside `region`, in global image coordinates.
///
/// The region is clamped to the image; a region entirely outside it finds
/// nothing. Components are cut at the region border.
pub fn find_boxes_in_region(
    binary: &GrayImage,
    region: &Region,
    filter: &SizeFilter,
) -> Vec<BoundingBox> {
    let Some(r) = region.clamp_to(binary.width(), binary.height()) else {
        return Vec::new();
    };
    let roi = image::imageops::crop_imm(binary, r.x1, r.y1, r.width(), r.height()).to_image();

    find_boxes(&roi, filter)
        .into_iter()
        .map(|b| b.translate(r.x1, r.y1))
        .collect()
}

/// Union box of every qualifying component in `region`.
///
/// `None` means no label was found, which differs from a found box of any size.
pub fn union_in_region(
    binary: &GrayImage,
    region: &Region,
    filter: &SizeFilter,
) -> Option<BoundingBox> {
    BoundingBox::union_all(&find_boxes_in_region(binary, region, filter))
}
