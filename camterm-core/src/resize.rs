use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::format::{Image, Size};

/// Bilinear resample of an RGB24 image to `target` texels.
///
/// Returns the input untouched when it already has the requested size.
/// Mono images are rejected rather than coerced.
pub fn resize(image: &Image, target: Size) -> Result<Cow<'_, Image>> {
    if image.size() == target {
        return Ok(Cow::Borrowed(image));
    }
    if !image.is_color() {
        return Err(Error::Unsupported("resize is only defined for color images"));
    }
    if target.is_empty() {
        return Ok(Cow::Owned(Image::new(Vec::new(), target)?));
    }
    let src = image.size();
    if src.is_empty() {
        return Err(Error::EmptySource(src));
    }

    let scale_x = src.width as f64 / target.width as f64;
    let scale_y = src.height as f64 / target.height as f64;
    let mut data = Vec::with_capacity(target.width as usize * target.height as usize * 3);

    for y in 0..target.height {
        let (y0, y1, dy) = neighbours(y, scale_y, src.height);
        for x in 0..target.width {
            let (x0, x1, dx) = neighbours(x, scale_x, src.width);

            let top_left = image.rgb_at(x0, y0);
            let top_right = image.rgb_at(x1, y0);
            let bottom_left = image.rgb_at(x0, y1);
            let bottom_right = image.rgb_at(x1, y1);

            let channels = [
                (top_left.r, top_right.r, bottom_left.r, bottom_right.r),
                (top_left.g, top_right.g, bottom_left.g, bottom_right.g),
                (top_left.b, top_right.b, bottom_left.b, bottom_right.b),
            ];
            for (tl, tr, bl, br) in channels {
                let top = lerp(tl as f64, tr as f64, dx);
                let bottom = lerp(bl as f64, br as f64, dx);
                data.push(lerp(top, bottom, dy).clamp(0.0, 255.0) as u8);
            }
        }
    }

    Ok(Cow::Owned(Image::new(data, target)?))
}

/// Source neighbours and blend weight for destination index `dst`.
/// Both neighbours are clamped to `[0, len - 1]`.
fn neighbours(dst: u32, scale: f64, len: u32) -> (u32, u32, f64) {
    let pos = ((dst as f64 + 0.5) * scale - 0.5).max(0.0);
    let last = len - 1;
    let lo = (pos as u32).min(last);
    let hi = (lo + 1).min(last);
    (lo, hi, (pos - lo as f64).clamp(0.0, 1.0))
}

// a + (b - a) * t keeps uniform regions exact. The weighted form
// (1 - t) * a + t * b can land a hair below an integer and truncate one lower.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
