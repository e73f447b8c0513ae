use fast_image_resize::images::Image as FirImage;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};

use camterm_core::format::{Image, Size};
use camterm_core::{Error, Result};

/// Shrinks decoded frames toward the display size before they reach the
/// core resampler, which then only sees frames that already fit.
pub struct FrameResizer {
    target: Option<Size>,
    resizer: Resizer,
    options: ResizeOptions,
}

impl FrameResizer {
    pub fn new() -> Self {
        Self {
            target: None,
            resizer: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        }
    }

    pub fn set_target(&mut self, size: Size) {
        self.target = Some(size);
    }

    /// Downscale `image` to the target. Frames already at or below the
    /// target in either dimension pass through untouched.
    pub fn shrink(&mut self, image: Image) -> Result<Image> {
        let Some(target) = self.target else {
            return Ok(image);
        };
        let src = image.size();
        if target.is_empty() || src.width <= target.width || src.height <= target.height {
            return Ok(image);
        }

        let src_image = FirImage::from_vec_u8(src.width, src.height, image.into_data(), PixelType::U8x3)
            .map_err(|e| Error::SourceUnavailable(format!("failed to wrap frame: {e}")))?;
        let mut dst_image = FirImage::new(target.width, target.height, PixelType::U8x3);

        self.resizer
            .resize(&src_image, &mut dst_image, &self.options)
            .map_err(|e| Error::SourceUnavailable(format!("resize failed: {e}")))?;

        Image::new(dst_image.into_vec(), target)
    }
}
