use log::{info, warn};

use crate::display::Display;
use crate::error::{Error, Result};
use crate::format::Size;
use crate::resize::resize;
use crate::source::FrameSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// The source failed; nothing of this frame was drawn.
    Skipped,
    EndOfStream,
}

/// Pulls frames from a source and pushes them through a display, one at a
/// time: read, resample to the display size, render.
///
/// The display is finalized when the driver is dropped if [`finish`] was not
/// reached, so the terminal is restored on early returns too. A panicking
/// thread skips this and leaves teardown to the panic hook.
///
/// [`finish`]: FrameDriver::finish
pub struct FrameDriver<S: FrameSource, D: Display> {
    source: S,
    display: D,
    hinted: Option<Size>,
    started: bool,
    frames: u64,
    skipped: u64,
}

impl<S: FrameSource, D: Display> FrameDriver<S, D> {
    pub fn new(source: S, display: D) -> Self {
        Self {
            source,
            display,
            hinted: None,
            started: false,
            frames: 0,
            skipped: 0,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.display.initialize()?;
        self.started = true;
        let size = self.display.size();
        info!("rendering at {}x{} texels", size.width, size.height);
        Ok(())
    }

    /// Run one frame.
    pub fn step(&mut self) -> Result<FrameOutcome> {
        let target = self.display.size();
        if self.hinted != Some(target) {
            self.source.optimize_for(target);
            self.hinted = Some(target);
        }

        let image = match self.source.read() {
            Ok(Some(image)) => image,
            Ok(None) => return Ok(FrameOutcome::EndOfStream),
            Err(Error::SourceUnavailable(reason)) => {
                self.skipped += 1;
                warn!("skipping frame: {reason}");
                return Ok(FrameOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };

        let resized = resize(&image, target)?;
        self.display.render(&resized)?;
        self.frames += 1;
        Ok(FrameOutcome::Rendered)
    }

    /// Tell the display the terminal changed size.
    pub fn resize_terminal(&mut self, terminal: Size) -> Result<()> {
        self.display.resize_terminal(terminal)
    }

    pub fn finish(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        info!(
            "stream done: {} frames rendered, {} skipped",
            self.frames, self.skipped
        );
        self.display.finalize()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn frames_skipped(&self) -> u64 {
        self.skipped
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: FrameSource, D: Display> Drop for FrameDriver<S, D> {
    fn drop(&mut self) {
        // The panic hook has already restored the terminal; clearing now
        // would wipe the panic message.
        if self.started && !std::thread::panicking() {
            if let Err(e) = self.display.finalize() {
                warn!("failed to restore display: {e}");
            }
        }
    }
}
