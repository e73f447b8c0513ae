use std::io::{self, Write};

use crate::format::Rgb;

pub const HALF_BLOCK: &str = "▄";

/// Where positioned cell draws go.
pub trait CellSink {
    /// Draw one half-block cell at 0-indexed `(x, y)`.
    fn draw_cell(&mut self, x: u16, y: u16, fg: Rgb, bg: Rgb) -> io::Result<()>;

    /// Called once after the last draw of a frame.
    fn end_frame(&mut self) -> io::Result<()>;
}

/// Encodes cell draws as ANSI true-color escapes into a writer.
///
/// Each cell is written straight through, so the writer's own buffering
/// decides how much terminal latency a single draw pays.
pub struct AnsiSink<W: Write> {
    out: W,
    buf: Vec<u8>,
}

impl<W: Write> AnsiSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            buf: Vec::with_capacity(64),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CellSink for AnsiSink<W> {
    fn draw_cell(&mut self, x: u16, y: u16, fg: Rgb, bg: Rgb) -> io::Result<()> {
        self.buf.clear();
        encode_cell(&mut self.buf, x, y, fg, bg);
        self.out.write_all(&self.buf)
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[0m")?;
        self.out.flush()
    }
}

/// Cursor move to row `y + 1`, column `x + 1`, then a styled half block.
pub fn encode_cell(buf: &mut Vec<u8>, x: u16, y: u16, fg: Rgb, bg: Rgb) {
    write_cursor_pos(buf, y.saturating_add(1), x.saturating_add(1));
    write_fg(buf, fg);
    write_bg(buf, bg);
    buf.extend_from_slice(HALF_BLOCK.as_bytes());
}

pub(crate) fn write_fg(buf: &mut Vec<u8>, c: Rgb) {
    buf.extend_from_slice(b"\x1b[38;2;");
    write_rgb(buf, c);
}

pub(crate) fn write_bg(buf: &mut Vec<u8>, c: Rgb) {
    buf.extend_from_slice(b"\x1b[48;2;");
    write_rgb(buf, c);
}

/// 256-color palette foreground.
pub(crate) fn write_fg_indexed(buf: &mut Vec<u8>, index: u8) {
    buf.extend_from_slice(b"\x1b[38;5;");
    write_u8(buf, index);
    buf.push(b'm');
}

pub(crate) fn write_cursor_pos(buf: &mut Vec<u8>, row: u16, col: u16) {
    buf.extend_from_slice(b"\x1b[");
    write_u16(buf, row);
    buf.push(b';');
    write_u16(buf, col);
    buf.push(b'H');
}

fn write_rgb(buf: &mut Vec<u8>, c: Rgb) {
    write_u8(buf, c.r);
    buf.push(b';');
    write_u8(buf, c.g);
    buf.push(b';');
    write_u8(buf, c.b);
    buf.push(b'm');
}

/// Integer-to-ASCII without going through `fmt`.
fn write_u8(buf: &mut Vec<u8>, v: u8) {
    if v >= 100 {
        buf.push(b'0' + v / 100);
    }
    if v >= 10 {
        buf.push(b'0' + (v / 10) % 10);
    }
    buf.push(b'0' + v % 10);
}

fn write_u16(buf: &mut Vec<u8>, v: u16) {
    let mut digits = [0u8; 5];
    let mut n = v;
    let mut len = 0;
    loop {
        digits[len] = b'0' + (n % 10) as u8;
        len += 1;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    buf.extend(digits[..len].iter().rev());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_one_indexed_position_and_colors() {
        let mut buf = Vec::new();
        encode_cell(&mut buf, 0, 9, Rgb::new(255, 7, 30), Rgb::new(0, 100, 2));
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "\x1b[10;1H\x1b[38;2;255;7;30m\x1b[48;2;0;100;2m▄"
        );
    }

    #[test]
    fn integer_formatting() {
        let mut buf = Vec::new();
        for v in [0u16, 7, 10, 99, 100, 1234, 65535] {
            buf.clear();
            write_u16(&mut buf, v);
            assert_eq!(buf, v.to_string().into_bytes());
        }
        for v in [0u8, 9, 10, 99, 100, 255] {
            buf.clear();
            write_u8(&mut buf, v);
            assert_eq!(buf, v.to_string().into_bytes());
        }
    }

    #[test]
    fn sink_writes_through_and_resets_at_frame_end() {
        let mut sink = AnsiSink::new(Vec::new());
        sink.draw_cell(2, 3, Rgb::default(), Rgb::default()).unwrap();
        assert!(sink.get_ref().starts_with(b"\x1b[4;3H"));
        sink.end_frame().unwrap();
        assert!(sink.into_inner().ends_with("▄\x1b[0m".as_bytes()));
    }

    #[test]
    fn indexed_foreground() {
        let mut buf = Vec::new();
        write_fg_indexed(&mut buf, 196);
        assert_eq!(buf, b"\x1b[38;5;196m");
    }
}
