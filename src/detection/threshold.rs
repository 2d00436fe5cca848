use image::GrayImage;
use imageproc::contrast::{ThresholdType, threshold};

/// Foreground value in binarized images.
pub const FOREGROUND: u8 = 255;

/// Inverted binary threshold: pixels at or below `cutoff` become foreground.
///
/// Dark ink and the recessed display end up white on black, ready for
/// component labelling. Expects the unblurred intensity image.
pub fn binarize_dark(gray: &GrayImage, cutoff: u8) -> GrayImage {
    threshold(gray, cutoff, ThresholdType::BinaryInverted)
}
