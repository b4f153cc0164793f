//! Cambridge Silicon Radio vendor channel routing
//!
//! CSR vendor frames carry a one-byte channel descriptor. The LMP debug
//! channels hand the rest of the frame to the LMP dissector; anything else
//! is shown raw under its channel number.

use std::io::Write;

use crate::dissect::Ctx;
use crate::frame::Frame;
use crate::layers::lmp;
use crate::Result;

/// LMP PDU received from the remote device
const CHANNEL_LMP_RECV: u8 = 0x02;
/// LMP PDU transmitted by the local link manager
const CHANNEL_LMP_SEND: u8 = 0x03;

pub(crate) fn dissect<W: Write>(
    level: usize,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let channel = frm.read_u8()?;

    match channel {
        CHANNEL_LMP_RECV | CHANNEL_LMP_SEND => {
            frm.master = channel == CHANNEL_LMP_SEND;
            lmp::dissect(level, frm, ctx)
        }
        _ => {
            ctx.sink
                .line(level, frm, &format!("CSR: channel {channel}"))?;
            ctx.sink.raw_dump(level + 1, frm)
        }
    }
}
