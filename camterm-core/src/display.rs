//! Renderer variants sharing one [`Display`] capability.
//!
//! [`HalfBlockDisplay`] packs two texels into each cell with true color and
//! only redraws what changed. [`RampDisplay`] prints one ASCII glyph per
//! texel in the 256-color palette for terminals without true color.

use std::io::Write;

use crossterm::cursor;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use log::{debug, info};

use crate::buffer::ChangeBuffer;
use crate::error::{Error, Result};
use crate::flush::{Clock, FlushReport, FlushScheduler, FrameBudget, MonotonicClock};
use crate::format::{Image, Rgb, Size};
use crate::pixel::PixelPair;
use crate::render::{write_cursor_pos, write_fg_indexed, AnsiSink};

pub const DEFAULT_MARGIN: u32 = 5;

/// Something frames can be shown on. Chosen once per stream.
pub trait Display {
    fn initialize(&mut self) -> Result<()>;

    fn finalize(&mut self) -> Result<()>;

    /// Texel size the next image should be resampled to.
    fn size(&self) -> Size;

    fn render(&mut self, image: &Image) -> Result<()>;

    /// The terminal now has `terminal` cells.
    fn resize_terminal(&mut self, terminal: Size) -> Result<()>;
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn initialize(&mut self) -> Result<()> {
        (**self).initialize()
    }

    fn finalize(&mut self) -> Result<()> {
        (**self).finalize()
    }

    fn size(&self) -> Size {
        (**self).size()
    }

    fn render(&mut self, image: &Image) -> Result<()> {
        (**self).render(image)
    }

    fn resize_terminal(&mut self, terminal: Size) -> Result<()> {
        (**self).resize_terminal(terminal)
    }
}

/// Usable cell grid inside the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    pub terminal: Size,
    /// Cells left free on the right and bottom edges.
    pub margin: u32,
    pub max_size: Option<Size>,
}

impl GridLayout {
    pub fn new(terminal: Size) -> Self {
        Self {
            terminal,
            margin: DEFAULT_MARGIN,
            max_size: None,
        }
    }

    pub fn cells(&self) -> Size {
        let usable = Size::new(
            self.terminal.width.saturating_sub(self.margin),
            self.terminal.height.saturating_sub(self.margin),
        );
        match self.max_size {
            Some(max) => usable.min(max),
            None => usable,
        }
    }
}

fn clear_screen<W: Write>(out: &mut W, show_cursor: bool) -> Result<()> {
    out.write_all(b"\x1b[0m")?;
    if show_cursor {
        queue!(out, Clear(ClearType::All), cursor::Show)?;
    } else {
        queue!(out, Clear(ClearType::All), cursor::Hide)?;
    }
    out.flush()?;
    Ok(())
}

fn cell_index(v: u32) -> u16 {
    v.min(u16::MAX as u32) as u16
}

/// True-color differential renderer.
pub struct HalfBlockDisplay<W: Write, C: Clock = MonotonicClock> {
    sink: AnsiSink<W>,
    buffer: ChangeBuffer,
    scheduler: FlushScheduler<C>,
    layout: GridLayout,
    last_report: FlushReport,
}

impl<W: Write> HalfBlockDisplay<W, MonotonicClock> {
    pub fn new(out: W, layout: GridLayout, budget: FrameBudget) -> Self {
        Self::with_clock(out, layout, budget, MonotonicClock)
    }
}

impl<W: Write, C: Clock> HalfBlockDisplay<W, C> {
    pub fn with_clock(out: W, layout: GridLayout, budget: FrameBudget, clock: C) -> Self {
        Self {
            sink: AnsiSink::new(out),
            buffer: ChangeBuffer::new(),
            scheduler: FlushScheduler::with_clock(budget, clock),
            layout,
            last_report: FlushReport::default(),
        }
    }

    pub fn buffer(&self) -> &ChangeBuffer {
        &self.buffer
    }

    pub fn frames_rendered(&self) -> u64 {
        self.scheduler.frames_rendered()
    }

    pub fn last_report(&self) -> FlushReport {
        self.last_report
    }

    pub fn writer(&self) -> &W {
        self.sink.get_ref()
    }
}

impl<W: Write, C: Clock> Display for HalfBlockDisplay<W, C> {
    fn initialize(&mut self) -> Result<()> {
        self.buffer.reset();
        self.scheduler.restart_warm_up();
        clear_screen(self.sink.get_mut(), false)
    }

    fn finalize(&mut self) -> Result<()> {
        clear_screen(self.sink.get_mut(), true)
    }

    fn size(&self) -> Size {
        let cells = self.layout.cells();
        Size::new(cells.width, cells.height.saturating_mul(2))
    }

    fn render(&mut self, image: &Image) -> Result<()> {
        if !image.is_color() {
            return Err(Error::Unsupported("half-block rendering needs a color image"));
        }
        // Never sample outside the image or the grid, whichever is smaller.
        let grid = self.layout.cells();
        let cols = cell_index(image.size().width.min(grid.width));
        let rows = cell_index((image.size().height / 2).min(grid.height));

        for y in 0..rows {
            for x in 0..cols {
                self.buffer.set(x, y, PixelPair::sample(image, x, y));
            }
        }

        self.last_report = self.scheduler.flush(&mut self.buffer, &mut self.sink)?;
        Ok(())
    }

    fn resize_terminal(&mut self, terminal: Size) -> Result<()> {
        info!(
            "terminal resized to {}x{}, repainting",
            terminal.width, terminal.height
        );
        self.layout.terminal = terminal;
        self.buffer.reset();
        self.scheduler.restart_warm_up();
        clear_screen(self.sink.get_mut(), false)
    }
}

pub const RAMP: &[u8] = b" .:-=+*#%@";

/// Per-channel and intensity gamma for the ramp renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gamma {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub intensity: f32,
}

impl Default for Gamma {
    fn default() -> Self {
        Self {
            red: 1.1,
            green: 1.0,
            blue: 1.0,
            intensity: 10.0,
        }
    }
}

fn correct(value: f32, gamma: f32) -> f32 {
    (value / 255.0).powf(1.0 / gamma)
}

/// Ramp glyph for a luma value in `0..=255`.
pub fn ramp_glyph(intensity: f32, gamma: Option<&Gamma>) -> u8 {
    let last = RAMP.len() - 1;
    let index = match gamma {
        Some(g) => (correct(intensity, g.intensity) * last as f32) as usize,
        None => intensity as usize / (256 / last),
    };
    RAMP[index.min(last)]
}

/// Index into the xterm 6x6x6 color cube.
pub fn cube_index(c: Rgb, gamma: Option<&Gamma>) -> u8 {
    let c = match gamma {
        Some(g) => Rgb::new(
            (correct(c.r as f32, g.red) * 255.0) as u8,
            (correct(c.g as f32, g.green) * 255.0) as u8,
            (correct(c.b as f32, g.blue) * 255.0) as u8,
        ),
        None => c,
    };
    16 + 36 * (c.r / 51) + 6 * (c.g / 51) + c.b / 51
}

/// Character-ramp renderer. Redraws the whole visible grid every frame.
pub struct RampDisplay<W: Write> {
    out: W,
    layout: GridLayout,
    mono: bool,
    gamma: Option<Gamma>,
    buf: Vec<u8>,
}

impl<W: Write> RampDisplay<W> {
    pub fn new(out: W, layout: GridLayout) -> Self {
        Self {
            out,
            layout,
            mono: false,
            gamma: None,
            buf: Vec::new(),
        }
    }

    /// Print glyphs in the terminal's default color.
    pub fn mono(mut self, mono: bool) -> Self {
        self.mono = mono;
        self
    }

    pub fn gamma(mut self, gamma: Option<Gamma>) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn writer(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Display for RampDisplay<W> {
    fn initialize(&mut self) -> Result<()> {
        clear_screen(&mut self.out, false)
    }

    fn finalize(&mut self) -> Result<()> {
        clear_screen(&mut self.out, true)
    }

    fn size(&self) -> Size {
        self.layout.cells()
    }

    fn render(&mut self, image: &Image) -> Result<()> {
        let grid = self.layout.cells();
        let cols = image.size().width.min(grid.width);
        let rows = image.size().height.min(grid.height);
        let colored = !self.mono && image.is_color();
        let gamma = self.gamma.as_ref();

        self.buf.clear();
        for y in 0..rows {
            write_cursor_pos(&mut self.buf, cell_index(y + 1), 1);
            let mut last_color = None;
            for x in 0..cols {
                if colored {
                    let index = cube_index(image.rgb(x, y)?, gamma);
                    if last_color != Some(index) {
                        write_fg_indexed(&mut self.buf, index);
                        last_color = Some(index);
                    }
                }
                self.buf.push(ramp_glyph(image.intensity(x, y)?, gamma));
            }
        }
        self.buf.extend_from_slice(b"\x1b[0m");
        debug!("ramp frame: {}x{} cells, {} bytes", cols, rows, self.buf.len());

        self.out.write_all(&self.buf)?;
        self.out.flush()?;
        Ok(())
    }

    fn resize_terminal(&mut self, terminal: Size) -> Result<()> {
        self.layout.terminal = terminal;
        clear_screen(&mut self.out, false)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_log::test;

    use super::*;

    fn gray(size: Size, v: u8) -> Image {
        let len = size.width as usize * size.height as usize * 3;
        Image::new(vec![v; len], size).unwrap()
    }

    fn layout(cols: u32, rows: u32) -> GridLayout {
        GridLayout {
            terminal: Size::new(cols, rows),
            margin: 0,
            max_size: None,
        }
    }

    fn unlimited() -> FrameBudget {
        FrameBudget {
            frame_time_limit: None,
            warm_up_frames: 0,
        }
    }

    #[test]
    fn grid_subtracts_margin_and_applies_cap() {
        let mut l = GridLayout::new(Size::new(80, 24));
        assert_eq!(l.cells(), Size::new(75, 19));
        l.max_size = Some(Size::new(40, 100));
        assert_eq!(l.cells(), Size::new(40, 19));
        assert_eq!(GridLayout::new(Size::new(3, 3)).cells(), Size::new(0, 0));
    }

    #[test]
    fn half_block_size_doubles_rows() {
        let display = HalfBlockDisplay::new(Vec::new(), GridLayout::new(Size::new(85, 25)), unlimited());
        assert_eq!(display.size(), Size::new(80, 40));
    }

    #[test]
    fn second_identical_frame_draws_nothing() {
        let mut display = HalfBlockDisplay::new(Vec::new(), layout(4, 2), unlimited());
        let img = gray(Size::new(4, 4), 90);

        display.render(&img).unwrap();
        assert_eq!(display.last_report().emitted, 8);
        display.render(&img).unwrap();
        assert_eq!(display.last_report().emitted, 0);
        assert_eq!(display.frames_rendered(), 2);
    }

    #[test]
    fn sampling_is_clamped_to_image_and_grid() {
        // Grid is 4x2 cells but the image only covers 3x1.
        let mut display = HalfBlockDisplay::new(Vec::new(), layout(4, 2), unlimited());
        display.render(&gray(Size::new(3, 3), 10)).unwrap();
        assert_eq!(display.last_report().emitted, 3);
        assert!(display.buffer().remembered(3, 0).is_none());
        assert!(display.buffer().remembered(0, 1).is_none());

        // Image larger than the grid.
        let mut display = HalfBlockDisplay::new(Vec::new(), layout(2, 1), unlimited());
        display.render(&gray(Size::new(10, 10), 10)).unwrap();
        assert_eq!(display.last_report().emitted, 2);
    }

    #[test]
    fn resize_forces_full_repaint() {
        let budget = FrameBudget {
            frame_time_limit: Some(Duration::ZERO),
            warm_up_frames: 0,
        };
        let mut display = HalfBlockDisplay::new(Vec::new(), layout(2, 1), budget);
        let img = gray(Size::new(2, 2), 1);
        display.render(&img).unwrap();
        display.render(&img).unwrap();

        display.resize_terminal(Size::new(3, 1)).unwrap();
        assert_eq!(display.frames_rendered(), 0);
        display.render(&gray(Size::new(3, 2), 1)).unwrap();
        assert_eq!(display.last_report().emitted, 3);
    }

    #[test]
    fn half_block_rejects_mono_images() {
        let mut display = HalfBlockDisplay::new(Vec::new(), layout(2, 1), unlimited());
        let mono = Image::new_mono(vec![0; 4], Size::new(2, 2)).unwrap();
        assert!(matches!(display.render(&mono), Err(Error::Unsupported(_))));
    }

    #[test]
    fn initialize_and_finalize_toggle_cursor() {
        let mut display = HalfBlockDisplay::new(Vec::new(), layout(2, 1), unlimited());
        display.initialize().unwrap();
        assert!(display.writer().ends_with(b"\x1b[?25l"));
        display.finalize().unwrap();
        assert!(display.writer().ends_with(b"\x1b[?25h"));
    }

    #[test]
    fn ramp_glyph_endpoints() {
        assert_eq!(ramp_glyph(0.0, None), b' ');
        assert_eq!(ramp_glyph(255.0, None), b'@');
        assert_eq!(ramp_glyph(0.0, Some(&Gamma::default())), b' ');
        assert_eq!(ramp_glyph(255.0, Some(&Gamma::default())), b'@');
        // Strong intensity gamma lifts dark values up the ramp.
        let rank = |glyph: u8| RAMP.iter().position(|&c| c == glyph).unwrap();
        let lifted = rank(ramp_glyph(40.0, Some(&Gamma::default())));
        assert!(lifted > rank(ramp_glyph(40.0, None)));
    }

    #[test]
    fn cube_index_corners() {
        assert_eq!(cube_index(Rgb::new(0, 0, 0), None), 16);
        assert_eq!(cube_index(Rgb::new(255, 255, 255), None), 231);
        assert_eq!(cube_index(Rgb::new(255, 0, 0), None), 196);
        assert_eq!(cube_index(Rgb::new(255, 255, 255), Some(&Gamma::default())), 231);
    }

    #[test]
    fn ramp_frame_layout() {
        let mut display = RampDisplay::new(Vec::new(), layout(2, 2)).mono(true);
        assert_eq!(display.size(), Size::new(2, 2));
        display.render(&gray(Size::new(2, 2), 255)).unwrap();
        assert_eq!(display.writer().as_slice(), b"\x1b[1;1H@@\x1b[2;1H@@\x1b[0m");
    }

    #[test]
    fn ramp_colors_once_per_run() {
        let mut display = RampDisplay::new(Vec::new(), layout(3, 1));
        display.render(&gray(Size::new(3, 1), 0)).unwrap();
        assert_eq!(display.writer().as_slice(), b"\x1b[1;1H\x1b[38;5;16m   \x1b[0m");
    }
}
