use crate::error::{Error, Result};

/// Width and height, either of an image in texels or of a terminal in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Component-wise minimum.
    pub fn min(self, other: Size) -> Size {
        Size::new(self.width.min(other.width), self.height.min(other.height))
    }
}

/// One 24-bit color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `factor`, truncating and saturating at 255.
    pub fn boosted(self, factor: f64) -> Rgb {
        let scale = |c: u8| (c as f64 * factor).clamp(0.0, 255.0) as u8;
        Rgb::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// ITU-R BT.601 luma.
    pub fn luma(self) -> f32 {
        0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// Three bytes per texel, R G B.
    Color,
    /// One intensity byte per texel.
    Mono,
}

impl ColorMode {
    pub fn channels(self) -> usize {
        match self {
            ColorMode::Color => 3,
            ColorMode::Mono => 1,
        }
    }
}

/// A row-major texel buffer. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
    size: Size,
    mode: ColorMode,
}

impl Image {
    /// Wrap RGB24 data.
    pub fn new(data: Vec<u8>, size: Size) -> Result<Self> {
        Self::with_mode(data, size, ColorMode::Color)
    }

    /// Wrap one-byte-per-texel intensity data.
    pub fn new_mono(data: Vec<u8>, size: Size) -> Result<Self> {
        Self::with_mode(data, size, ColorMode::Mono)
    }

    pub fn with_mode(data: Vec<u8>, size: Size, mode: ColorMode) -> Result<Self> {
        let expected = size.width as usize * size.height as usize * mode.channels();
        if data.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, size, mode })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_color(&self) -> bool {
        self.mode == ColorMode::Color
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of row `y`, or `None` past the last row.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.size.height {
            return None;
        }
        let stride = self.size.width as usize * self.mode.channels();
        let start = y as usize * stride;
        Some(&self.data[start..start + stride])
    }

    /// Channel bytes of one texel, or `None` outside the image.
    pub fn texel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.size.width {
            return None;
        }
        let channels = self.mode.channels();
        let start = x as usize * channels;
        self.row(y).map(|row| &row[start..start + channels])
    }

    pub fn rgb(&self, x: u32, y: u32) -> Result<Rgb> {
        if !self.is_color() {
            return Err(Error::Unsupported("rgb access on a mono image"));
        }
        let texel = self.texel(x, y).ok_or(Error::OutOfBounds {
            x,
            y,
            size: self.size,
        })?;
        Ok(Rgb::new(texel[0], texel[1], texel[2]))
    }

    /// Luma for color images, the raw byte for mono images.
    pub fn intensity(&self, x: u32, y: u32) -> Result<f32> {
        let texel = self.texel(x, y).ok_or(Error::OutOfBounds {
            x,
            y,
            size: self.size,
        })?;
        Ok(match self.mode {
            ColorMode::Color => Rgb::new(texel[0], texel[1], texel[2]).luma(),
            ColorMode::Mono => texel[0] as f32,
        })
    }

    /// Unchecked-in-release color read for hot loops whose bounds the caller
    /// has already clamped.
    pub(crate) fn rgb_at(&self, x: u32, y: u32) -> Rgb {
        debug_assert!(self.is_color(), "rgb_at on a mono image");
        debug_assert!(
            x < self.size.width && y < self.size.height,
            "texel ({x}, {y}) outside {:?}",
            self.size
        );
        let off = (y as usize * self.size.width as usize + x as usize) * 3;
        Rgb::new(self.data[off], self.data[off + 1], self.data[off + 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Image {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 10) as u8, (y * 10) as u8, 200]);
            }
        }
        Image::new(data, Size::new(width, height)).unwrap()
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = Image::new(vec![0; 11], Size::new(2, 2)).unwrap_err();
        assert!(matches!(
            err,
            Error::BufferSize {
                expected: 12,
                actual: 11
            }
        ));
        assert!(Image::new_mono(vec![0; 4], Size::new(2, 2)).is_ok());
    }

    #[test]
    fn bounded_access() {
        let img = gradient(3, 2);
        assert_eq!(img.rgb(2, 1).unwrap(), Rgb::new(20, 10, 200));
        assert_eq!(img.texel(1, 0), Some(&[10u8, 0, 200][..]));
        assert!(img.texel(3, 0).is_none());
        assert!(matches!(img.rgb(0, 2), Err(Error::OutOfBounds { x: 0, y: 2, .. })));
    }

    #[test]
    fn intensity_is_luma_or_raw_byte() {
        let img = Image::new(vec![100, 50, 200], Size::new(1, 1)).unwrap();
        let expected = 0.299 * 100.0 + 0.587 * 50.0 + 0.114 * 200.0;
        assert!((img.intensity(0, 0).unwrap() - expected).abs() < 1e-3);

        let mono = Image::new_mono(vec![77], Size::new(1, 1)).unwrap();
        assert_eq!(mono.intensity(0, 0).unwrap(), 77.0);
        assert!(matches!(mono.rgb(0, 0), Err(Error::Unsupported(_))));
    }

    #[test]
    fn boost_saturates() {
        assert_eq!(Rgb::new(10, 210, 250).boosted(1.18), Rgb::new(11, 247, 255));
    }
}
