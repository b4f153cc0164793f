//! Hierarchical text rendering
//!
//! The sink never feeds back into decode decisions; it only turns decoded
//! fields into indented lines. The first line emitted for a frame carries
//! the optional timestamp and a direction marker (`<` sent, `>` received);
//! every later line of the same frame, including all nested-layer output,
//! starts with a blank filler instead so multi-layer output groups visually
//! under one frame.

use std::io::Write;

use crate::config::{Config, PayloadMode};
use crate::frame::Frame;
use crate::Result;

// ----------------------------------------------------------------------------
// Output Sink
// ----------------------------------------------------------------------------

/// Indented line renderer over any writer
#[derive(Debug)]
pub struct OutputSink<W: Write> {
    out: W,
    timestamps: bool,
    payload: PayloadMode,
    width: usize,
    started: bool,
}

impl<W: Write> OutputSink<W> {
    pub fn new(out: W, cfg: &Config) -> Self {
        Self {
            out,
            timestamps: cfg.timestamps,
            payload: cfg.payload,
            width: cfg.dump_width,
            started: false,
        }
    }

    /// Reset per-frame state; the next line gets the frame prefix
    pub fn begin_frame(&mut self) {
        self.started = false;
    }

    /// Consume the sink, returning the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn prefix(&mut self, level: usize, frm: &Frame<'_>) -> Result<()> {
        if self.started {
            write!(self.out, "  ")?;
        } else {
            if self.timestamps {
                write!(
                    self.out,
                    "{:8}.{:06} ",
                    frm.timestamp.secs, frm.timestamp.usecs
                )?;
            }
            write!(self.out, "{} ", frm.direction.marker())?;
            self.started = true;
        }
        if level > 0 {
            write!(self.out, "{:width$}", "", width = level * 2)?;
        }
        Ok(())
    }

    /// Emit one line at the given nesting level
    pub fn line(&mut self, level: usize, frm: &Frame<'_>, text: &str) -> Result<()> {
        self.prefix(level, frm)?;
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    /// Render bytes as a grid of two-digit hex pairs
    pub fn hex_dump(&mut self, level: usize, frm: &Frame<'_>, bytes: &[u8]) -> Result<()> {
        for row in bytes.chunks(self.width) {
            self.prefix(level, frm)?;
            for b in row {
                write!(self.out, "{b:02X} ")?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Render bytes as a grid of printable-or-dot characters
    pub fn ascii_dump(&mut self, level: usize, frm: &Frame<'_>, bytes: &[u8]) -> Result<()> {
        for row in bytes.chunks(self.width) {
            self.prefix(level, frm)?;
            for &b in row {
                let c = if printable(b) { b as char } else { '.' };
                write!(self.out, "{c} ")?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Consume the next `n` bytes from the cursor and hex-grid them
    pub fn hex_field(&mut self, level: usize, frm: &mut Frame<'_>, n: usize) -> Result<()> {
        let bytes = frm.read_bytes(n)?;
        self.hex_dump(level, frm, bytes)
    }

    /// Consume and render everything left in the frame
    ///
    /// Zero remaining bytes emits nothing; the cursor always ends at the end
    /// of the frame.
    pub fn raw_dump(&mut self, level: usize, frm: &mut Frame<'_>) -> Result<()> {
        let bytes = frm.take_remaining();
        if bytes.is_empty() {
            return Ok(());
        }
        match self.payload {
            PayloadMode::Hex => self.hex_dump(level, frm, bytes),
            PayloadMode::Ascii => self.ascii_dump(level, frm, bytes),
            PayloadMode::None => Ok(()),
        }
    }
}

/// Printable ASCII, the range `isprint` accepts in the C locale
pub(crate) fn printable(b: u8) -> bool {
    (0x20..0x7f).contains(&b)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
