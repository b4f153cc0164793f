//! Captured frame with a bounds-checked sequential cursor
//!
//! One [`Frame`] is one capture unit handed in by the frame source (live
//! monitor socket, snoop file replay, ...). The dissector chain consumes it
//! strictly left to right; every read is checked against the remaining
//! length, so a malformed capture surfaces as [`DumpError::Truncated`]
//! instead of reading past the buffer.

use crate::{DumpError, Result};

// ----------------------------------------------------------------------------
// Direction and Timestamp
// ----------------------------------------------------------------------------

/// Transfer direction of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to controller
    Sent,
    /// Controller to host
    Received,
}

impl Direction {
    /// Single-character marker used on the first output line of a frame
    pub(crate) fn marker(self) -> char {
        match self {
            Direction::Sent => '<',
            Direction::Received => '>',
        }
    }
}

/// Capture timestamp, seconds plus microseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp {
    pub secs: u64,
    pub usecs: u32,
}

impl Timestamp {
    pub fn new(secs: u64, usecs: u32) -> Self {
        Self { secs, usecs }
    }
}

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// One captured host/controller packet plus its dissection cursor
///
/// Exclusively owned by one dissection pass; only cursor advances mutate it.
/// The handle, channel id and boundary flags start out zeroed and are filled
/// in by the layers that learn them (ACL fills the handle, L2CAP the channel
/// id), so deeper layers can key session state off them.
#[derive(Debug)]
pub struct Frame<'a> {
    data: &'a [u8],
    pos: usize,
    /// Transfer direction
    pub direction: Direction,
    /// Capture timestamp
    pub timestamp: Timestamp,
    /// Connection handle, once the ACL layer has parsed it
    pub handle: u16,
    /// Channel id, once the multiplexing layer has parsed it
    pub cid: u16,
    /// ACL boundary/broadcast flags
    pub flags: u8,
    /// Link role for LMP exchanges (set by the vendor channel routing)
    pub master: bool,
}

impl<'a> Frame<'a> {
    /// Wrap a captured byte buffer
    pub fn new(data: &'a [u8], direction: Direction, timestamp: Timestamp) -> Self {
        Self {
            data,
            pos: 0,
            direction,
            timestamp,
            handle: 0,
            cid: 0,
            flags: 0,
            master: false,
        }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Borrow the unconsumed tail without advancing
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Consume and return the next `n` bytes uninterpreted
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(DumpError::truncated(n, self.remaining()));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Consume `n` bytes without looking at them
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Consume everything that is left
    pub fn take_remaining(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a big-endian (network order) 16-bit value
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian 32-bit value
    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a big-endian 64-bit value
    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a little-endian 16-bit value (Bluetooth byte order)
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a little-endian 32-bit value
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a little-endian 64-bit value
    pub fn read_u64_le(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
