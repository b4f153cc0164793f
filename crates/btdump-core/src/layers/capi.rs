//! CAPI 2.0 message dissection
//!
//! CAPI messages ride over a dedicated L2CAP channel. Every message starts
//! with an eight-byte header (total length, application id, command,
//! subcommand, message number); the body grammar depends on the command and
//! subcommand pair. All multi-byte fields are little endian.

use std::io::Write;

use crate::config::LayerFilter;
use crate::dissect::Ctx;
use crate::frame::Frame;
use crate::output::printable;
use crate::Result;

// Subcommand qualifiers
const SUBCMD_REQ: u8 = 0x80;
const SUBCMD_CONF: u8 = 0x81;
const SUBCMD_IND: u8 = 0x82;
const SUBCMD_RESP: u8 = 0x83;

// Commands with a dedicated body decoder
const CMD_LISTEN: u8 = 0x05;
const CMD_INFO: u8 = 0x08;
const CMD_INTEROPERABILITY: u8 = 0x20;
const CMD_FACILITY: u8 = 0x80;
const CMD_MANUFACTURER: u8 = 0xff;

fn cmd_str(cmd: u8) -> &'static str {
    match cmd {
        0x01 => "ALERT",
        0x02 => "CONNECT",
        0x03 => "CONNECT_ACTIVE",
        0x04 => "DISCONNECT",
        CMD_LISTEN => "LISTEN",
        CMD_INFO => "INFO",
        CMD_INTEROPERABILITY => "INTEROPERABILITY",
        0x41 => "SELECT_B_PROTOCOL",
        CMD_FACILITY => "FACILITY",
        0x82 => "CONNECT_B3",
        0x83 => "CONNECT_B3_ACTIVE",
        0x84 => "DISCONNECT_B3",
        0x86 => "DATA_B3",
        0x87 => "RESET_B3",
        CMD_MANUFACTURER => "MANUFACTURER",
        _ => "UNKNOWN",
    }
}

fn subcmd_str(subcmd: u8) -> &'static str {
    match subcmd {
        SUBCMD_REQ => "REQ",
        SUBCMD_CONF => "CONF",
        SUBCMD_IND => "IND",
        SUBCMD_RESP => "RESP",
        _ => "UNKN",
    }
}

fn interopsel_str(sel: u16) -> &'static str {
    match sel {
        0x0000 => "USB Device Management",
        0x0001 => "Bluetooth Device Management",
        _ => "Unknown",
    }
}

fn func_str(func: u16) -> &'static str {
    match func {
        0 => "Register",
        1 => "Release",
        2 => "Get_Profile",
        3 => "Get_Manufacturer",
        4 => "Get_Version",
        5 => "Get_Serial_Number",
        6 => "Manufacturer",
        7 => "Echo_Loopback",
        _ => "Unknown",
    }
}

fn facilitysel_str(sel: u16) -> &'static str {
    match sel {
        0x0000 => "Handset",
        0x0001 => "DTMF",
        0x0002 => "V.42 bis",
        0x0003 => "Supplementary Services",
        0x0004 => "Power management wakeup",
        0x0005 => "Line Interconnect",
        0x0006 => "DTMF",
        _ => "Unknown",
    }
}

fn info_str(info: u16) -> &'static str {
    match info {
        0x0000 => "No error",
        0x0001 => "NCPI not supported by current protocol, NCPI ignored",
        0x0002 => "Flags not supported by current protocol, flags ignored",
        0x2001 => "Message not supported in current state",
        0x2002 => "Incorrect Controller/PLCI/NCCI",
        0x2003 => "No PLCI available",
        0x2004 => "No NCCI available",
        0x2005 => "No Listen resources available",
        0x2007 => "Illegal message parameter coding",
        0x2008 => "No interconnection resources available",
        0x3001 => "B1 protocol not supported",
        0x3002 => "B2 protocol not supported",
        0x3003 => "B3 protocol not supported",
        0x3004 => "B1 protocol parameter not supported",
        0x3005 => "B2 protocol parameter not supported",
        0x3006 => "B3 protocol parameter not supported",
        0x3007 => "B protocol combination not supported",
        0x3008 => "NCPI not supported",
        0x3009 => "CIP Value unknown",
        0x300a => "Flags not supported (reserved bits)",
        0x300b => "Facility not supported",
        0x300c => "Data length not supported by current protocol",
        0x300d => "Reset procedure not supported by current protocol",
        0x300f => "Unsupported interoperability",
        0x3011 => "Facility specific function not supported",
        0x3301 => "Protocol error, Layer 1",
        0x3302 => "Protocol error, Layer 2",
        0x3303 => "Protocol error, Layer 3",
        0x3304 => "Another application got that call",
        0x3305 => "Cleared by Call Control Supervision",
        0x3400 => "Disconnect cause from the network in accordance with Q.850/ETS 300 102-1",
        _ => "Unknown",
    }
}

pub(crate) fn dissect<W: Write>(
    level: usize,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let len = frm.read_u16_le()?.saturating_sub(8);
    let appl = frm.read_u16_le()?;
    let cmd = frm.read_u8()?;
    let subcmd = frm.read_u8()?;
    let msgnum = frm.read_u16_le()?;

    if !ctx.enabled(LayerFilter::CAPI) {
        frm.take_remaining();
        return Ok(());
    }

    ctx.sink.line(
        level,
        frm,
        &format!(
            "CAPI_{}_{}: appl {appl} msgnum {msgnum} len {len}",
            cmd_str(cmd),
            subcmd_str(subcmd)
        ),
    )?;

    match cmd {
        CMD_LISTEN => cmd_listen(level + 1, subcmd, frm, ctx),
        CMD_INFO => cmd_info(level + 1, subcmd, frm, ctx),
        CMD_INTEROPERABILITY => cmd_interoperability(level + 1, subcmd, frm, ctx),
        CMD_FACILITY => cmd_facility(level + 1, subcmd, frm, ctx),
        CMD_MANUFACTURER => cmd_manufacturer(level + 1, frm, ctx),
        _ => ctx.sink.raw_dump(level, frm),
    }
}

/// Controller/PLCI/NCCI address shared by most message bodies
fn cmd_common<W: Write>(
    level: usize,
    subcmd: u8,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let val = frm.read_u32_le()?;
    let ctr = (val & 0xff) as u8;
    let plci = ((val >> 8) & 0xff) as u8;
    let ncci = (val >> 16) as u16;

    let kind = if ctr & 0x80 != 0 { "Ext." } else { "Int." };
    ctx.sink
        .line(level, frm, &format!("Controller: {} {kind}", ctr & 0x7f))?;

    if plci > 0 {
        ctx.sink.line(level, frm, &format!("PLCI: 0x{plci:02x}"))?;
    }
    if ncci > 0 {
        ctx.sink.line(level, frm, &format!("NCCI: 0x{ncci:04x}"))?;
    }

    if subcmd == SUBCMD_CONF {
        let info = frm.read_u16_le()?;
        ctx.sink.line(
            level,
            frm,
            &format!("Info: 0x{info:04x} ({})", info_str(info)),
        )?;
    }
    Ok(())
}

fn cmd_listen<W: Write>(
    level: usize,
    subcmd: u8,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    cmd_common(level, subcmd, frm, ctx)?;

    if subcmd != SUBCMD_REQ {
        return Ok(());
    }

    let mask = frm.read_u32_le()?;
    ctx.sink
        .line(level, frm, &format!("Info mask: 0x{mask:08x}"))?;

    let cip = frm.read_u32_le()?;
    let cip2 = frm.read_u32_le()?;
    let text = if cip2 > 0 {
        format!("CIP mask:  0x{cip:08x} 0x{cip2:08x}")
    } else {
        format!("CIP mask:  0x{cip:08x}")
    };
    ctx.sink.line(level, frm, &text)?;

    let len = usize::from(frm.read_u8()?);
    if len > 0 {
        ctx.sink.line(level, frm, "Calling party number:")?;
        ctx.sink.hex_field(level, frm, len)?;
    }

    let len = usize::from(frm.read_u8()?);
    if len > 0 {
        ctx.sink.line(level, frm, "Calling party subaddress:")?;
        ctx.sink.hex_field(level, frm, len)?;
    }
    Ok(())
}

fn cmd_info<W: Write>(
    level: usize,
    subcmd: u8,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    cmd_common(level, subcmd, frm, ctx)?;

    match subcmd {
        SUBCMD_REQ => {
            let len = usize::from(frm.read_u8()?);
            if len > 0 {
                ctx.sink.line(level, frm, "Called party number:")?;
                ctx.sink.hex_field(level, frm, len)?;
            }

            let len = usize::from(frm.read_u8()?);
            if len > 0 {
                ctx.sink.line(level, frm, "Additional info:")?;
                ctx.sink.hex_field(level, frm, len)?;
            }
            Ok(())
        }
        SUBCMD_IND => {
            let info = frm.read_u16_le()?;
            ctx.sink.line(level, frm, &format!("Info number: {info}"))?;

            let len = usize::from(frm.read_u8()?);
            if len > 0 {
                ctx.sink.line(level, frm, "Info element:")?;
                ctx.sink.hex_field(level, frm, len)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Profile block returned by Get_Profile
fn profile<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let nctr = frm.read_u16_le()?;
    let nchn = frm.read_u16_le()?;

    if nchn == 0 {
        return ctx
            .sink
            .line(level, frm, &format!("Number of controllers: {nctr}"));
    }

    ctx.sink.line(level, frm, &format!("Controller: {nctr}"))?;
    ctx.sink
        .line(level, frm, &format!("Number of B-channels: {nchn}"))?;

    let global = frm.read_u32_le()?;
    ctx.sink
        .line(level, frm, &format!("Global options: 0x{global:04x}"))?;
    let b1 = frm.read_u32_le()?;
    ctx.sink
        .line(level, frm, &format!("B1 protocol support: 0x{b1:08x}"))?;
    let b2 = frm.read_u32_le()?;
    ctx.sink
        .line(level, frm, &format!("B2 protocol support: 0x{b2:08x}"))?;
    let b3 = frm.read_u32_le()?;
    ctx.sink
        .line(level, frm, &format!("B3 protocol support: 0x{b3:08x}"))?;

    // Reserved words between the protocol masks and the vendor block
    frm.skip(24)?;

    ctx.sink
        .line(level, frm, "Manufacturer-specific information:")?;
    ctx.sink.hex_field(level, frm, 20)
}

fn cmd_interoperability<W: Write>(
    level: usize,
    subcmd: u8,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let outer_info = if subcmd == SUBCMD_CONF {
        frm.read_u16_le()?
    } else {
        0
    };
    let sel = frm.read_u16_le()?;
    frm.skip(1)?;
    let func = if subcmd != SUBCMD_RESP {
        let func = frm.read_u16_le()?;
        frm.skip(1)?;
        func
    } else {
        0
    };

    ctx.sink.line(
        level,
        frm,
        &format!("Selector: 0x{sel:04x} ({})", interopsel_str(sel)),
    )?;

    if sel != 0x0001 {
        ctx.sink.line(level, frm, &format!("Function: {func}"))?;
        if subcmd == SUBCMD_CONF {
            ctx.sink.line(
                level,
                frm,
                &format!("Info: 0x{outer_info:04x} ({})", info_str(outer_info)),
            )?;
        }
        return ctx.sink.raw_dump(level + 1, frm);
    }

    ctx.sink.line(
        level,
        frm,
        &format!("Function: {func} ({})", func_str(func)),
    )?;

    match subcmd {
        SUBCMD_REQ => match func {
            0 => {
                let nconn = frm.read_u16_le()?;
                ctx.sink
                    .line(level + 1, frm, &format!("maxLogicalConnections: {nconn}"))?;
                let blkcnt = frm.read_u16_le()?;
                ctx.sink
                    .line(level + 1, frm, &format!("maxBDataBlocks: {blkcnt}"))?;
                let blklen = frm.read_u16_le()?;
                ctx.sink
                    .line(level + 1, frm, &format!("maxBDataLen: {blklen}"))
            }
            2..=5 => {
                let ctr = frm.read_u32_le()?;
                ctx.sink.line(level + 1, frm, &format!("Controller: {ctr}"))
            }
            _ => ctx.sink.raw_dump(level + 1, frm),
        },
        SUBCMD_CONF => match func {
            0 | 1 => {
                let info = frm.read_u16_le()?;
                ctx.sink.line(
                    level + 1,
                    frm,
                    &format!("Info: 0x{info:04x} ({})", info_str(info)),
                )
            }
            2 => {
                let info = frm.read_u16_le()?;
                ctx.sink.line(
                    level + 1,
                    frm,
                    &format!("Info: 0x{info:04x} ({})", info_str(info)),
                )?;
                frm.skip(1)?;
                profile(level + 1, frm, ctx)
            }
            3 => {
                let info = frm.read_u16_le()?;
                ctx.sink.line(
                    level + 1,
                    frm,
                    &format!("Info: 0x{info:04x} ({})", info_str(info)),
                )?;
                let ctr = frm.read_u32_le()?;
                ctx.sink
                    .line(level + 1, frm, &format!("Controller: {ctr}"))?;
                let id = length_prefixed_str(frm, usize::MAX)?;
                ctx.sink
                    .line(level + 1, frm, &format!("Identification: \"{id}\""))
            }
            4 => {
                let value = frm.read_u32_le()?;
                ctx.sink
                    .line(level + 1, frm, &format!("Return value: 0x{value:04x}"))?;
                let ctr = frm.read_u32_le()?;
                ctx.sink
                    .line(level + 1, frm, &format!("Controller: {ctr}"))?;
                let major = frm.read_u32_le()?;
                let minor = frm.read_u32_le()?;
                ctx.sink
                    .line(level + 1, frm, &format!("CAPI: {major}.{minor}"))?;
                let major = frm.read_u32_le()?;
                let minor = frm.read_u32_le()?;
                ctx.sink.line(
                    level + 1,
                    frm,
                    &format!(
                        "Manufacture: {}.{:01x}{:01x}-{:02} ({major}.{minor})",
                        (major & 0xf0) >> 4,
                        (major & 0x0f) << 4,
                        (minor & 0xf0) >> 4,
                        minor & 0x0f
                    ),
                )
            }
            5 => {
                let value = frm.read_u32_le()?;
                ctx.sink
                    .line(level + 1, frm, &format!("Return value: 0x{value:04x}"))?;
                let ctr = frm.read_u32_le()?;
                ctx.sink
                    .line(level + 1, frm, &format!("Controller: {ctr}"))?;
                let serial = length_prefixed_str(frm, 7)?;
                ctx.sink
                    .line(level + 1, frm, &format!("Serial number: {serial}"))
            }
            _ => ctx.sink.raw_dump(level + 1, frm),
        },
        _ => ctx.sink.raw_dump(level, frm),
    }
}

fn cmd_facility<W: Write>(
    level: usize,
    subcmd: u8,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    cmd_common(level, subcmd, frm, ctx)?;

    let sel = frm.read_u16_le()?;
    frm.skip(1)?;

    ctx.sink.line(
        level,
        frm,
        &format!("Selector: 0x{sel:04x} ({})", facilitysel_str(sel)),
    )?;
    ctx.sink.raw_dump(level, frm)
}

fn cmd_manufacturer<W: Write>(
    level: usize,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let ctr = frm.read_u32_le()?;
    ctx.sink.line(level, frm, &format!("Controller: {ctr}"))?;

    let id = frm.read_bytes(4)?;
    let mut text = if id.iter().all(|&b| printable(b)) {
        format!(
            "Manufacturer: {}",
            id.iter().map(|&b| b as char).collect::<String>()
        )
    } else {
        format!(
            "Manufacturer: 0x{:02x} 0x{:02x} 0x{:02x} 0x{:02x}",
            id[0], id[1], id[2], id[3]
        )
    };

    // AVM extends the id with a class/function/length triple
    if id == b"AVM!" {
        let class = frm.read_u32_le()?;
        let func = frm.read_u32_le()?;
        let len = match frm.read_u8()? {
            0xff => frm.read_u16_le()?,
            n => u16::from(n),
        };
        text.push_str(&format!(" [class {class} func {func} len {len}]"));
    }
    ctx.sink.line(level, frm, &text)?;

    ctx.sink.raw_dump(level, frm)
}

/// Length-prefixed byte string, rendered printable-or-dot and clamped to
/// `max` characters
fn length_prefixed_str(frm: &mut Frame<'_>, max: usize) -> Result<String> {
    let len = usize::from(frm.read_u8()?);
    let bytes = frm.read_bytes(len)?;
    Ok(bytes
        .iter()
        .take(max)
        .map(|&b| if printable(b) { b as char } else { '.' })
        .collect())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
