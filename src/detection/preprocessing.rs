use image::{DynamicImage, GrayImage, ImageReader};
use imageproc::filter::median_filter;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PanelError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Median filter aperture (odd, in pixels).
    pub median_aperture: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { median_aperture: 5 }
    }
}

/// Load an image file, sniffing the format from its contents.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let load_err = |source: image::ImageError| PanelError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| load_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(load_err)
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Median blur to suppress speckle before circle detection.
///
/// Never feed this into text binarization: it merges neighbouring glyphs.
pub fn apply_median(img: &GrayImage, aperture: u32) -> GrayImage {
    let radius = aperture / 2;
    if radius == 0 {
        return img.clone();
    }
    median_filter(img, radius, radius)
}
