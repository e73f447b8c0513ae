use crate::format::{Image, Rgb};

/// Foreground brightness multiplier applied when a pair is drawn.
pub const BRIGHTNESS_BOOST: f64 = 1.18;

/// One terminal cell: two vertically stacked texels at cell `(x, y)`.
/// Top comes from texel row `2y`, bottom from row `2y + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelPair {
    pub x: u16,
    pub y: u16,
    pub top: Rgb,
    pub bottom: Rgb,
}

impl PixelPair {
    /// Read the pair for cell `(x, y)` out of a resized color image.
    ///
    /// The caller keeps `x < width` and `2y + 1 < height`; the frame loop
    /// clamps its iteration bounds so this holds.
    pub fn sample(image: &Image, x: u16, y: u16) -> Self {
        let col = x as u32;
        let row = y as u32 * 2;
        Self {
            x,
            y,
            top: image.rgb_at(col, row),
            bottom: image.rgb_at(col, row + 1),
        }
    }

    /// Change magnitude from `other` to `self`: the larger of the top and
    /// bottom signed channel sums, each difference doubled. Opposite shifts
    /// across channels cancel.
    pub fn distance_to(&self, other: &PixelPair) -> i32 {
        signed_sum(self.top, other.top).max(signed_sum(self.bottom, other.bottom))
    }

    /// Color of the half-block glyph.
    pub fn foreground(&self) -> Rgb {
        self.top.boosted(BRIGHTNESS_BOOST)
    }

    /// Color behind the half-block glyph.
    pub fn background(&self) -> Rgb {
        self.bottom
    }
}

fn signed_sum(a: Rgb, b: Rgb) -> i32 {
    ((a.r as i32 - b.r as i32) << 1)
        + ((a.g as i32 - b.g as i32) << 1)
        + ((a.b as i32 - b.b as i32) << 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Size;

    fn pair(top: (u8, u8, u8), bottom: (u8, u8, u8)) -> PixelPair {
        PixelPair {
            x: 0,
            y: 0,
            top: Rgb::new(top.0, top.1, top.2),
            bottom: Rgb::new(bottom.0, bottom.1, bottom.2),
        }
    }

    #[test]
    fn samples_rows_two_y_and_two_y_plus_one() {
        // 2 wide, 4 tall; every texel encodes its own coordinates.
        let mut data = Vec::new();
        for y in 0..4u8 {
            for x in 0..2u8 {
                data.extend_from_slice(&[x, y, 42]);
            }
        }
        let img = Image::new(data, Size::new(2, 4)).unwrap();

        let p = PixelPair::sample(&img, 1, 1);
        assert_eq!((p.x, p.y), (1, 1));
        assert_eq!(p.top, Rgb::new(1, 2, 42));
        assert_eq!(p.bottom, Rgb::new(1, 3, 42));
    }

    #[test]
    fn distance_is_doubled_signed_sum() {
        let old = pair((10, 10, 10), (0, 0, 0));
        let new = pair((20, 10, 10), (0, 0, 5));
        assert_eq!(new.distance_to(&old), 20);
        // Reverse direction goes negative on both halves.
        assert_eq!(old.distance_to(&new), -10);
    }

    #[test]
    fn opposite_channel_shifts_cancel() {
        let old = pair((100, 100, 100), (7, 7, 7));
        let new = pair((150, 50, 100), (7, 7, 7));
        assert_ne!(old, new);
        assert_eq!(new.distance_to(&old), 0);
    }

    #[test]
    fn glyph_colors() {
        let p = pair((100, 200, 250), (1, 2, 3));
        assert_eq!(p.foreground(), Rgb::new(100, 200, 250).boosted(BRIGHTNESS_BOOST));
        assert_eq!(p.foreground().b, 255);
        assert_eq!(p.background(), Rgb::new(1, 2, 3));
    }
}
