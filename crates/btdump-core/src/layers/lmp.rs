//! Link Manager Protocol dissection
//!
//! LMP packs its header into bits rather than bytes: bit 0 of the first
//! byte is the transaction id, bits 1-7 the short opcode. Short opcodes
//! above 123 escape into a second byte; the true opcode is then
//! `short + (extension << 7)`. Field-level decoding of the bodies is gated
//! on the verbose flag; without it every PDU raw-renders after its heading.

use std::io::Write;

use crate::dissect::Ctx;
use crate::frame::Frame;
use crate::output::printable;
use crate::Result;

// Extended opcodes, escape 127 plus extension byte << 7
const ACCEPTED_EXT: u16 = 127 + (1 << 7);
const NOT_ACCEPTED_EXT: u16 = 127 + (2 << 7);
const FEATURES_REQ_EXT: u16 = 127 + (3 << 7);
const FEATURES_RES_EXT: u16 = 127 + (4 << 7);
const PACKET_TYPE_TABLE_REQ: u16 = 127 + (11 << 7);
const ESCO_LINK_REQ: u16 = 127 + (12 << 7);
const REMOVE_ESCO_LINK_REQ: u16 = 127 + (13 << 7);
const CHANNEL_CLASSIFICATION_REQ: u16 = 127 + (16 << 7);
const CHANNEL_CLASSIFICATION: u16 = 127 + (17 << 7);

fn opcode_str(opcode: u16) -> &'static str {
    match opcode {
        1 => "name_req",
        2 => "name_res",
        3 => "accepted",
        4 => "not_accepted",
        5 => "clkoffset_req",
        6 => "clkoffset_res",
        7 => "detach",
        8 => "in_rand",
        9 => "comb_key",
        10 => "unit_key",
        11 => "au_rand",
        12 => "sres",
        13 => "temp_rand",
        14 => "temp_key",
        15 => "encryption_mode_req",
        16 => "encryption_key_size_req",
        17 => "start_encryption_req",
        18 => "stop_encryption_req",
        19 => "switch_req",
        20 => "hold",
        21 => "hold_req",
        22 => "sniff",
        23 => "sniff_req",
        24 => "unsniff_req",
        25 => "park_req",
        26 => "park",
        27 => "set_broadcast_scan_window",
        28 => "modify_beacon",
        29 => "unpark_BD_ADDR_req",
        30 => "unpark_PM_ADDR_req",
        31 => "incr_power_req",
        32 => "decr_power_req",
        33 => "max_power",
        34 => "min_power",
        35 => "auto_rate",
        36 => "prefered_rate",
        37 => "version_req",
        38 => "version_res",
        39 => "feature_req",
        40 => "feature_res",
        41 => "quality_of_service",
        42 => "quality_of_service_req",
        43 => "SCO_link_req",
        44 => "remove_SCO_link_req",
        45 => "max_slot",
        46 => "max_slot_req",
        47 => "timing_accuracy_req",
        48 => "timing_accuracy_res",
        49 => "setup_complete",
        50 => "use_semi_permanent_key",
        51 => "host_connection_req",
        52 => "slot_offset",
        53 => "page_mode_req",
        54 => "page_scan_mode_req",
        55 => "supervision_timeout",
        56 => "test_activate",
        57 => "test_control",
        58 => "encryption_key_size_mask_req",
        59 => "encryption_key_size_mask_res",
        60 => "set_AFH",
        ACCEPTED_EXT => "accepted_ext",
        NOT_ACCEPTED_EXT => "not_accepted_ext",
        FEATURES_REQ_EXT => "features_req_ext",
        FEATURES_RES_EXT => "features_res_ext",
        PACKET_TYPE_TABLE_REQ => "packet_type_table_req",
        ESCO_LINK_REQ => "eSCO_link_req",
        REMOVE_ESCO_LINK_REQ => "remove_eSCO_link_req",
        CHANNEL_CLASSIFICATION_REQ => "channel_classification_req",
        CHANNEL_CLASSIFICATION => "channel_classification",
        _ => "unknown",
    }
}

fn version_str(ver: u8) -> &'static str {
    match ver {
        0 => "1.0b",
        1 => "1.1",
        2 => "1.2",
        3 => "2.0",
        _ => "unknown",
    }
}

fn compid_str(compid: u16) -> &'static str {
    match compid {
        0 => "Ericsson Technology Licensing",
        1 => "Nokia Mobile Phones",
        2 => "Intel Corp.",
        3 => "IBM Corp.",
        4 => "Toshiba Corp.",
        9 => "Infineon Technologies AG",
        10 => "Cambridge Silicon Radio",
        13 => "Texas Instruments Inc.",
        15 => "Broadcom Corporation",
        _ => "unknown",
    }
}

pub(crate) fn dissect<W: Write>(
    level: usize,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let first = frm.read_u8()?;
    let tid = first & 0x01;
    let mut opcode = u16::from(first >> 1);
    let extended = opcode > 123;
    if extended {
        opcode += u16::from(frm.read_u8()?) << 7;
    }

    let role = if frm.master { 'm' } else { 's' };
    let initiator = if tid == 1 { 's' } else { 'm' };
    let heading = if extended {
        format!(
            "LMP({role}): {}({initiator}): op code {}/{}",
            opcode_str(opcode),
            opcode & 0x7f,
            opcode >> 7
        )
    } else {
        format!(
            "LMP({role}): {}({initiator}): op code {opcode}",
            opcode_str(opcode)
        )
    };
    ctx.sink.line(level, frm, &heading)?;

    if !ctx.cfg.verbose {
        return ctx.sink.raw_dump(level, frm);
    }

    match opcode {
        1 => name_req(level + 1, frm, ctx),
        2 => name_res(level + 1, frm, ctx),
        3 => accepted(level + 1, frm, ctx),
        4 => not_accepted(level + 1, frm, ctx),
        7 => detach(level + 1, frm, ctx),
        // No body
        35 | 49 | 51 => Ok(()),
        37 | 38 => version(level + 1, frm, ctx),
        39 | 40 => features(level + 1, frm, ctx),
        60 => set_afh(level + 1, frm, ctx),
        ACCEPTED_EXT => accepted_ext(level + 1, frm, ctx),
        NOT_ACCEPTED_EXT => not_accepted_ext(level + 1, frm, ctx),
        FEATURES_REQ_EXT | FEATURES_RES_EXT => features_ext(level + 1, frm, ctx),
        PACKET_TYPE_TABLE_REQ => packet_type_table(level + 1, frm, ctx),
        _ => ctx.sink.raw_dump(level, frm),
    }
}

fn name_req<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let offset = frm.read_u8()?;
    ctx.sink.line(level, frm, &format!("name offset {offset}"))
}

fn name_res<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let offset = frm.read_u8()?;
    let length = frm.read_u8()?;
    let name = frm.read_bytes(14)?;

    ctx.sink.line(level, frm, &format!("name offset {offset}"))?;
    ctx.sink.line(level, frm, &format!("name length {length}"))?;

    let shown = usize::from(length).min(name.len());
    let fragment: String = name[..shown]
        .iter()
        .map(|&b| if printable(b) { b as char } else { '.' })
        .collect();
    ctx.sink
        .line(level, frm, &format!("name fragment '{fragment}'"))
}

fn accepted<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let opcode = u16::from(frm.read_u8()?);
    ctx.sink.line(
        level,
        frm,
        &format!("op code {opcode} ({})", opcode_str(opcode)),
    )
}

fn not_accepted<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let opcode = u16::from(frm.read_u8()?);
    let error = frm.read_u8()?;

    ctx.sink.line(
        level,
        frm,
        &format!("op code {opcode} ({})", opcode_str(opcode)),
    )?;
    ctx.sink
        .line(level, frm, &format!("error code 0x{error:02x}"))
}

fn detach<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let error = frm.read_u8()?;
    ctx.sink
        .line(level, frm, &format!("error code 0x{error:02x}"))
}

fn version<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let ver = frm.read_u8()?;
    let compid = frm.read_u16_le()?;
    let subver = frm.read_u16_le()?;

    ctx.sink
        .line(level, frm, &format!("VersNr {ver} ({})", version_str(ver)))?;
    ctx.sink.line(
        level,
        frm,
        &format!("CompId {compid} ({})", compid_str(compid)),
    )?;
    ctx.sink.line(level, frm, &format!("SubVersNr {subver}"))
}

fn features<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let features = frm.read_bytes(8)?;
    let mut text = String::from("features");
    for b in features {
        text.push_str(&format!(" 0x{b:02x}"));
    }
    ctx.sink.line(level, frm, &text)
}

fn set_afh<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let instant = frm.read_u32_le()?;
    let mode = frm.read_u8()?;
    let map = frm.read_bytes(10)?;

    ctx.sink
        .line(level, frm, &format!("AFH_instant 0x{instant:04x}"))?;
    ctx.sink.line(level, frm, &format!("AFH_mode {mode}"))?;
    ctx.sink
        .line(level, frm, &format!("AFH_channel_map 0x{}", hex::encode(map)))
}

fn accepted_ext<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let short = u16::from(frm.read_u8()?);
    let ext = u16::from(frm.read_u8()?);
    let opcode = short + (ext << 7);

    ctx.sink.line(
        level,
        frm,
        &format!(
            "op code {}/{} ({})",
            opcode & 0x7f,
            opcode >> 7,
            opcode_str(opcode)
        ),
    )
}

fn not_accepted_ext<W: Write>(
    level: usize,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let short = u16::from(frm.read_u8()?);
    let ext = u16::from(frm.read_u8()?);
    let opcode = short + (ext << 7);
    let error = frm.read_u8()?;

    ctx.sink.line(
        level,
        frm,
        &format!(
            "op code {}/{} ({})",
            opcode & 0x7f,
            opcode >> 7,
            opcode_str(opcode)
        ),
    )?;
    ctx.sink
        .line(level, frm, &format!("error code 0x{error:02x}"))
}

fn features_ext<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let page = frm.read_u8()?;
    let max = frm.read_u8()?;
    let features = frm.read_bytes(8)?;

    ctx.sink
        .line(level, frm, &format!("features page {page}"))?;
    ctx.sink
        .line(level, frm, &format!("max supported page {max}"))?;

    let mut text = String::from("extended features");
    for b in features {
        text.push_str(&format!(" 0x{b:02x}"));
    }
    ctx.sink.line(level, frm, &text)
}

fn packet_type_table<W: Write>(
    level: usize,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let table = frm.read_u8()?;
    let kind = match table {
        0 => "(1Mbps only)",
        1 => "(2/3Mbps)",
        _ => "(Reserved)",
    };
    ctx.sink
        .line(level, frm, &format!("packet type table {table} {kind}"))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dissect::Ctx;
    use crate::frame::{Direction, Frame, Timestamp};
    use crate::output::OutputSink;
    use crate::session::SessionState;

    fn run(cfg: &Config, data: &[u8], master: bool) -> String {
        let mut session = SessionState::new();
        let mut sink = OutputSink::new(Vec::new(), cfg);
        sink.begin_frame();
        let mut ctx = Ctx {
            cfg,
            session: &mut session,
            sink: &mut sink,
        };
        let mut frm = Frame::new(data, Direction::Received, Timestamp::default());
        frm.master = master;
        dissect(0, &mut frm, &mut ctx).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_short_opcode_heading() {
        // version_req (37), tid 0: first byte = 37 << 1
        let text = run(&Config::default(), &[37 << 1], true);
        assert_eq!(text, "> LMP(m): version_req(m): op code 37\n");
    }

    #[test]
    fn test_extended_opcode_combination() {
        // Short field 127 with tid set, extension byte 3:
        // opcode = 127 + (3 << 7) = 511
        let text = run(&Config::default(), &[0xff, 0x03], false);
        assert_eq!(text, "> LMP(s): features_req_ext(s): op code 127/3\n");
    }

    #[test]
    fn test_version_decoding() {
        let data = [37 << 1, 0x02, 0x0a, 0x00, 0x11, 0x03];
        let text = run(&Config::verbose(), &data, true);
        assert_eq!(
            text,
            "> LMP(m): version_req(m): op code 37\n\
             \x20   VersNr 2 (1.2)\n\
             \x20   CompId 10 (Cambridge Silicon Radio)\n\
             \x20   SubVersNr 785\n"
        );
    }

    #[test]
    fn test_features_decoding() {
        let mut data = vec![39 << 1];
        data.extend_from_slice(&[0xff, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x80]);
        let text = run(&Config::verbose(), &data, true);
        assert_eq!(
            text,
            "> LMP(m): feature_req(m): op code 39\n\
             \x20   features 0xff 0x00 0x01 0x02 0x03 0x04 0x05 0x80\n"
        );
    }

    #[test]
    fn test_set_afh_decoding() {
        let mut data = vec![60 << 1];
        data.extend_from_slice(&[0x78, 0x56, 0x34, 0x12]); // instant
        data.push(0x01); // mode
        data.extend_from_slice(&[0xaa; 10]); // channel map
        let text = run(&Config::verbose(), &data, false);
        assert_eq!(
            text,
            "> LMP(s): set_AFH(m): op code 60\n\
             \x20   AFH_instant 0x12345678\n\
             \x20   AFH_mode 1\n\
             \x20   AFH_channel_map 0xaaaaaaaaaaaaaaaaaaaa\n"
        );
    }

    #[test]
    fn test_name_res_clamps_fragment() {
        let mut data = vec![2 << 1, 0, 4];
        data.extend_from_slice(b"Test\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00");
        let text = run(&Config::verbose(), &data, true);
        assert!(text.contains("name fragment 'Test'\n"));
    }

    #[test]
    fn test_non_verbose_raw_renders_body() {
        let data = [37 << 1, 0x02, 0x0a, 0x00, 0x11, 0x03];
        let text = run(&Config::default(), &data, true);
        assert_eq!(
            text,
            "> LMP(m): version_req(m): op code 37\n  02 0A 00 11 03 \n"
        );
    }

    #[test]
    fn test_unknown_opcode_raw_renders() {
        let data = [99 << 1, 0xde, 0xad];
        let text = run(&Config::verbose(), &data, true);
        assert_eq!(
            text,
            "> LMP(m): unknown(m): op code 99\n  DE AD \n"
        );
    }
}
