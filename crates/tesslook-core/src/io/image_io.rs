use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};

use crate::error::Result;
use crate::frame::DecodedFrame;

/// Save a frame as 8-bit grayscale PNG.
///
/// Intensities map linearly from the finite data minimum (black) to maximum
/// (white); NaN pixels are written black. Row 0 of the frame lands on the
/// bottom row of the image.
pub fn save_png(frame: &DecodedFrame, path: &Path) -> Result<()> {
    let h = frame.height();
    let w = frame.width();
    let (lo, hi) = frame.finite_range().unwrap_or((0.0, 1.0));
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut img = GrayImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let v = frame.pixels[[row, col]];
            let val = if v.is_finite() {
                (((v - lo) / span).clamp(0.0, 1.0) * 255.0).round() as u8
            } else {
                0
            };
            img.put_pixel(col as u32, (h - 1 - row) as u32, Luma([val]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
