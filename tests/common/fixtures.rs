use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use tempfile::NamedTempFile;

pub const PANEL: Rgb<u8> = Rgb([235, 235, 230]);
pub const INK: Rgb<u8> = Rgb([20, 20, 20]);

/// Plain light panel of the given size.
pub fn blank_panel(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, PANEL)
}

/// Filled dark disc, as a knob photographs against the plate.
pub fn draw_knob(img: &mut RgbImage, cx: i32, cy: i32, radius: i32) {
    draw_filled_circle_mut(img, (cx, cy), radius, INK);
}

/// Filled dark rectangle.
pub fn draw_block(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32) {
    draw_filled_rect_mut(img, Rect::at(x, y).of_size(w, h), INK);
}

/// Dark outline `thickness` pixels wide.
pub fn draw_frame(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, thickness: u32) {
    let t = thickness as i32;
    draw_block(img, x, y, w, thickness);
    draw_block(img, x, y + h as i32 - t, w, thickness);
    draw_block(img, x, y, thickness, h);
    draw_block(img, x + w as i32 - t, y, thickness, h);
}

/// A row of `count` glyph-sized blocks starting at `(x, y)`.
pub fn draw_word(
    img: &mut RgbImage,
    x: i32,
    y: i32,
    count: u32,
    glyph_w: u32,
    glyph_h: u32,
    pitch: u32,
) {
    for i in 0..count {
        draw_block(img, x + (i * pitch) as i32, y, glyph_w, glyph_h);
    }
}

/// Writes `img` to a temporary PNG that lives as long as the returned handle.
pub fn save_temp(img: &RgbImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// Round-trips `img` through a PNG file and the crate's loader.
pub fn load_via_file(img: &RgbImage) -> DynamicImage {
    let file = save_temp(img);
    panelscan::load_image(file.path()).expect("Failed to load test image")
}
