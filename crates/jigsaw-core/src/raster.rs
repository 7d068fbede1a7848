//! Raster helpers on `image` buffers.

use image::{GrayImage, Rgb, RgbImage};

/// Bilinear sample of `img` at sub-pixel `(x, y)`, pixel centres on integers.
///
/// Channels are rounded to the nearest `u8`. Returns `None` when any of the
/// four taps falls outside the image.
pub fn sample_bilinear_rgb(img: &RgbImage, x: f32, y: f32) -> Option<Rgb<u8>> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let (w, h) = img.dimensions();
    let x0f = x.floor();
    let y0f = y.floor();
    if x0f < 0.0 || y0f < 0.0 {
        return None;
    }
    let x0 = x0f as u32;
    let y0 = y0f as u32;
    let fx = x - x0f;
    let fy = y - y0f;

    // Exact integer hits at the last row/column are allowed.
    let x1 = if fx > 0.0 { x0 + 1 } else { x0 };
    let y1 = if fy > 0.0 { y0 + 1 } else { y0 };
    if x1 >= w || y1 >= h {
        return None;
    }

    let p00 = img.get_pixel(x0, y0).0;
    let p10 = img.get_pixel(x1, y0).0;
    let p01 = img.get_pixel(x0, y1).0;
    let p11 = img.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bot = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        out[c] = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgb(out))
}

/// Copy the `width x height` window at `(x, y)` out of `img`.
///
/// The window is clipped to the image; an empty intersection yields a 0x0
/// buffer.
pub fn crop_rgb(img: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> RgbImage {
    let (cw, ch) = clip(img.width(), img.height(), x, y, width, height);
    RgbImage::from_fn(cw, ch, |i, j| *img.get_pixel(x + i, y + j))
}

/// Grayscale counterpart of [`crop_rgb`].
pub fn crop_gray(img: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> GrayImage {
    let (cw, ch) = clip(img.width(), img.height(), x, y, width, height);
    GrayImage::from_fn(cw, ch, |i, j| *img.get_pixel(x + i, y + j))
}

fn clip(img_w: u32, img_h: u32, x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
    let cw = img_w.saturating_sub(x).min(width);
    let ch = img_h.saturating_sub(y).min(height);
    (cw, ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn ramp() -> RgbImage {
        RgbImage::from_fn(4, 3, |x, y| Rgb([(x * 10) as u8, (y * 20) as u8, 7]))
    }

    #[test]
    fn integer_positions_return_the_pixel() {
        let img = ramp();
        assert_eq!(sample_bilinear_rgb(&img, 2.0, 1.0), Some(Rgb([20, 20, 7])));
        assert_eq!(sample_bilinear_rgb(&img, 3.0, 2.0), Some(Rgb([30, 40, 7])));
    }

    #[test]
    fn half_pixel_averages_neighbours() {
        let img = ramp();
        assert_eq!(sample_bilinear_rgb(&img, 0.5, 0.5), Some(Rgb([5, 10, 7])));
    }

    #[test]
    fn out_of_bounds_is_none() {
        let img = ramp();
        assert!(sample_bilinear_rgb(&img, -0.1, 0.0).is_none());
        assert!(sample_bilinear_rgb(&img, 3.5, 0.0).is_none());
        assert!(sample_bilinear_rgb(&img, 0.0, f32::NAN).is_none());
    }

    #[test]
    fn crops_are_clipped() {
        let img = ramp();
        let c = crop_rgb(&img, 2, 1, 10, 10);
        assert_eq!(c.dimensions(), (2, 2));
        assert_eq!(*c.get_pixel(0, 0), *img.get_pixel(2, 1));

        let g = GrayImage::from_pixel(5, 5, Luma([9]));
        assert_eq!(crop_gray(&g, 6, 0, 2, 2).dimensions(), (0, 2));
    }
}
