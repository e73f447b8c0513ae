use crate::error::Result;
use crate::format::{Image, Size};

/// Produces color frames at their native resolution.
pub trait FrameSource {
    /// Hint that frames will be resampled to `size`. Purely an optimization;
    /// sources are free to ignore it.
    fn optimize_for(&mut self, _size: Size) {}

    /// Block until the next frame. `Ok(None)` once the stream has ended.
    fn read(&mut self) -> Result<Option<Image>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn optimize_for(&mut self, size: Size) {
        (**self).optimize_for(size)
    }

    fn read(&mut self) -> Result<Option<Image>> {
        (**self).read()
    }
}

/// Animated synthetic gradient. Follows the size hint so no resampling is
/// needed downstream.
pub struct TestPattern {
    size: Size,
    frame: u32,
    frame_limit: Option<u32>,
}

impl TestPattern {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            frame: 0,
            frame_limit: None,
        }
    }

    /// End the stream after `limit` frames.
    pub fn with_frame_limit(mut self, limit: u32) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn frames_produced(&self) -> u32 {
        self.frame
    }

    fn draw(&self) -> Vec<u8> {
        let Size { width, height } = self.size;
        let shift = self.frame.wrapping_mul(4);
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width.max(1)).wrapping_add(shift) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                let b = if (x + y + self.frame) % 16 < 8 { 200 } else { 40 };
                data.extend_from_slice(&[r, g, b]);
            }
        }
        data
    }
}

impl FrameSource for TestPattern {
    fn optimize_for(&mut self, size: Size) {
        self.size = size;
    }

    fn read(&mut self) -> Result<Option<Image>> {
        if self.frame_limit.is_some_and(|limit| self.frame >= limit) {
            return Ok(None);
        }
        let image = Image::new(self.draw(), self.size)?;
        self.frame += 1;
        Ok(Some(image))
    }
}
