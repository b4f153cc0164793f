//! HCI packet dissection, the top of the layer chain
//!
//! Reads the one-byte packet-type discriminant and dispatches to the
//! command, event, ACL, SCO or vendor branch. The event branch is also where
//! the session's manufacturer id is learned: a Command Complete carrying the
//! Read Local Version reply announces it once, and every later vendor frame
//! consults it.

use std::io::Write;

use crate::config::LayerFilter;
use crate::dissect::Ctx;
use crate::frame::Frame;
use crate::layers::{l2cap, vendor};
use crate::tables::{
    cmd_opcode_ocf, cmd_opcode_ogf, cmd_opcode_pack, CMD_HOSTCTL, CMD_INFO, CMD_LINKCTL,
    CMD_LINKPOL, CMD_STATUS, EVENTS, EVT_CMD_COMPLETE, EVT_TESTING, EVT_VENDOR, HCI_ACLDATA_PKT,
    HCI_COMMAND_PKT, HCI_EVENT_PKT, HCI_SCODATA_PKT, HCI_VENDOR_PKT, OCF_READ_LOCAL_VERSION,
    OGF_HOST_CTL, OGF_INFO_PARAM, OGF_LINK_CTL, OGF_LINK_POLICY, OGF_STATUS_PARAM,
    OGF_TESTING_CMD, OGF_VENDOR_CMD, UNKNOWN,
};
use crate::Result;

/// Command Complete prefix: num_hci_command_packets (1) + opcode (2)
const CMD_COMPLETE_SIZE: usize = 3;
/// Manufacturer field offset inside a Command Complete body:
/// prefix + status (1) + hci_ver (1) + hci_rev (2) + lmp_ver (1)
const MANUFACTURER_OFFSET: usize = CMD_COMPLETE_SIZE + 5;

pub(crate) fn dissect<W: Write>(
    level: usize,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let ptype = frm.read_u8()?;

    match ptype {
        HCI_COMMAND_PKT => command(level, frm, ctx),
        HCI_EVENT_PKT => event(level, frm, ctx),
        HCI_ACLDATA_PKT => acl(level, frm, ctx),
        HCI_SCODATA_PKT => sco(level, frm, ctx),
        HCI_VENDOR_PKT => {
            ctx.sink
                .line(level, frm, &format!("Vendor data: len {}", frm.remaining()))?;
            ctx.sink.raw_dump(level, frm)
        }
        _ => {
            // Unknown packet types are not fatal
            if ctx.enabled(LayerFilter::HCI) {
                ctx.sink.line(
                    level,
                    frm,
                    &format!("Unknown: type 0x{ptype:02x} len {}", frm.remaining()),
                )?;
                ctx.sink.raw_dump(level, frm)
            } else {
                frm.take_remaining();
                Ok(())
            }
        }
    }
}

fn command<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let opcode = frm.read_u16_le()?;
    let plen = frm.read_u8()?;
    let ogf = cmd_opcode_ogf(opcode);
    let ocf = cmd_opcode_ocf(opcode);

    let name = match ogf {
        OGF_INFO_PARAM => CMD_INFO.lookup(ocf),
        OGF_HOST_CTL => CMD_HOSTCTL.lookup(ocf),
        OGF_LINK_CTL => CMD_LINKCTL.lookup(ocf),
        OGF_LINK_POLICY => CMD_LINKPOL.lookup(ocf),
        OGF_STATUS_PARAM => CMD_STATUS.lookup(ocf),
        OGF_TESTING_CMD => "Testing",
        OGF_VENDOR_CMD => "Vendor",
        _ => UNKNOWN,
    };

    if !ctx.enabled(LayerFilter::HCI) {
        frm.take_remaining();
        return Ok(());
    }

    ctx.sink.line(
        level,
        frm,
        &format!("HCI Command: {name} (0x{ogf:02x}|0x{ocf:04x}) plen {plen}"),
    )?;

    if ogf == OGF_VENDOR_CMD && ocf == 0 {
        let manufacturer = ctx.session.manufacturer_or(ctx.cfg.default_manufacturer);
        if let Some(dissect) = vendor::lookup::<W>(manufacturer) {
            return dissect(level + 1, frm, ctx);
        }
    }

    ctx.sink.raw_dump(level, frm)
}

fn event<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let evt = frm.read_u8()?;
    let plen = frm.read_u8()?;

    // The manufacturer id is session state, not text; it is learned even
    // when HCI output is filtered out.
    if evt == EVT_CMD_COMPLETE {
        let body = frm.remaining_bytes();
        if body.len() >= MANUFACTURER_OFFSET + 2 {
            let opcode = u16::from_le_bytes([body[1], body[2]]);
            if opcode == cmd_opcode_pack(OGF_INFO_PARAM, OCF_READ_LOCAL_VERSION) {
                let manufacturer =
                    u16::from_le_bytes([body[MANUFACTURER_OFFSET], body[MANUFACTURER_OFFSET + 1]]);
                ctx.session.learn_manufacturer(manufacturer);
            }
        }
    }

    if !ctx.enabled(LayerFilter::HCI) {
        frm.take_remaining();
        return Ok(());
    }

    let heading = if evt == EVT_TESTING {
        format!("HCI Event: Testing (0x{evt:02x}) plen {plen}")
    } else if evt == EVT_VENDOR {
        format!("HCI Event: Vendor (0x{evt:02x}) plen {plen}")
    } else if EVENTS.contains(u16::from(evt)) {
        format!(
            "HCI Event: {} (0x{evt:02x}) plen {plen}",
            EVENTS.lookup(u16::from(evt))
        )
    } else {
        format!("HCI Event: code 0x{evt:02x} plen {plen}")
    };
    ctx.sink.line(level, frm, &heading)?;

    if evt == EVT_VENDOR {
        let manufacturer = ctx.session.manufacturer_or(ctx.cfg.default_manufacturer);
        if let Some(dissect) = vendor::lookup::<W>(manufacturer) {
            return dissect(level + 1, frm, ctx);
        }
    }

    ctx.sink.raw_dump(level, frm)
}

fn acl<W: Write>(mut level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let raw_handle = frm.read_u16_le()?;
    let dlen = frm.read_u16_le()?;
    let handle = raw_handle & 0x0fff;
    let flags = (raw_handle >> 12) as u8;

    if ctx.enabled(LayerFilter::HCI) {
        ctx.sink.line(
            level,
            frm,
            &format!("ACL data: handle 0x{handle:04x} flags 0x{flags:02x} dlen {dlen}"),
        )?;
        level += 1;
    }

    frm.handle = handle;
    frm.flags = flags;

    if ctx.cfg.filter.beyond_hci() {
        l2cap::dissect(level, frm, ctx)
    } else if ctx.enabled(LayerFilter::HCI) {
        ctx.sink.raw_dump(level, frm)
    } else {
        frm.take_remaining();
        Ok(())
    }
}

fn sco<W: Write>(level: usize, frm: &mut Frame<'_>, ctx: &mut Ctx<'_, W>) -> Result<()> {
    let raw_handle = frm.read_u16_le()?;
    let dlen = frm.read_u8()?;
    let handle = raw_handle & 0x0fff;

    frm.handle = handle;

    if ctx.enabled(LayerFilter::SCO) {
        ctx.sink.line(
            level,
            frm,
            &format!("SCO data: handle 0x{handle:04x} dlen {dlen}"),
        )?;
        ctx.sink.raw_dump(level + 1, frm)
    } else {
        frm.take_remaining();
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::config::{Config, LayerFilter};
    use crate::frame::{Direction, Frame, Timestamp};
    use crate::{Dissector, ServiceProto};

    fn received(data: &[u8]) -> Frame<'_> {
        Frame::new(data, Direction::Received, Timestamp::default())
    }

    fn sent(data: &[u8]) -> Frame<'_> {
        Frame::new(data, Direction::Sent, Timestamp::default())
    }

    #[test]
    fn test_command_heading() {
        // Reset command: OGF 0x03, OCF 0x0003 -> opcode 0x0c03
        let data = [0x01, 0x03, 0x0c, 0x00];
        let mut d = Dissector::new(Config::default(), Vec::new());
        d.dissect(&mut sent(&data)).unwrap();

        let text = String::from_utf8(d.into_writer()).unwrap();
        assert_eq!(text, "< HCI Command: Reset (0x03|0x0003) plen 0\n");
    }

    #[test]
    fn test_unknown_event_code_heading() {
        let data = [0x04, 0x60, 0x00];
        let mut d = Dissector::new(Config::default(), Vec::new());
        d.dissect(&mut received(&data)).unwrap();

        let text = String::from_utf8(d.into_writer()).unwrap();
        assert_eq!(text, "> HCI Event: code 0x60 plen 0\n");
    }

    #[test]
    fn test_unknown_packet_type_is_not_fatal() {
        let data = [0x7b, 0xde, 0xad];
        let mut d = Dissector::new(Config::default(), Vec::new());
        d.dissect(&mut received(&data)).unwrap();

        let text = String::from_utf8(d.into_writer()).unwrap();
        assert_eq!(text, "> Unknown: type 0x7b len 2\n  DE AD \n");
    }

    #[test]
    fn test_manufacturer_learned_from_read_local_version_reply() {
        // Command Complete (0x0e), embedded opcode 0x1001 (Read Local
        // Version), manufacturer field = 10
        let data = [
            0x04, 0x0e, 0x0c, // event header
            0x01, 0x01, 0x10, // ncmd, opcode
            0x00, 0x01, 0x29, 0x02, 0x01, // status, hci_ver, hci_rev, lmp_ver
            0x0a, 0x00, // manufacturer
            0x33, 0x07, // lmp_subver
        ];
        let mut d = Dissector::new(Config::default(), Vec::new());
        d.dissect(&mut received(&data)).unwrap();
        assert_eq!(d.session().manufacturer(), Some(10));
    }

    #[test]
    fn test_other_command_complete_does_not_learn() {
        // Command Complete for Reset (opcode 0x0c03)
        let data = [0x04, 0x0e, 0x0c, 0x01, 0x03, 0x0c, 0x00, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut d = Dissector::new(Config::default(), Vec::new());
        d.dissect(&mut received(&data)).unwrap();
        assert_eq!(d.session().manufacturer(), None);
    }

    #[test]
    fn test_vendor_command_unknown_manufacturer_raw_renders() {
        // Vendor OGF, OCF 0 -> opcode 0xfc00; manufacturer never learned
        let data = [0x01, 0x00, 0xfc, 0x02, 0xaa, 0xbb];
        let mut d = Dissector::new(Config::default(), Vec::new());
        d.dissect(&mut sent(&data)).unwrap();

        let text = String::from_utf8(d.into_writer()).unwrap();
        assert_eq!(
            text,
            "< HCI Command: Vendor (0x3f|0x0000) plen 2\n  AA BB \n"
        );
    }

    #[test]
    fn test_vendor_command_dispatches_after_learning() {
        let mut d = Dissector::new(Config::default(), Vec::new());

        // Learn manufacturer 10 from a Read Local Version reply
        let reply = [
            0x04, 0x0e, 0x0c, 0x01, 0x01, 0x10, 0x00, 0x01, 0x29, 0x02, 0x01, 0x0a, 0x00, 0x33,
            0x07,
        ];
        d.dissect(&mut received(&reply)).unwrap();

        // Vendor command, CSR channel 0x15 -> CSR sub-dissector
        let cmd = [0x01, 0x00, 0xfc, 0x03, 0x15, 0xde, 0xad];
        d.dissect(&mut sent(&cmd)).unwrap();

        let text = String::from_utf8(d.into_writer()).unwrap();
        assert!(text.contains("HCI Command: Vendor (0x3f|0x0000) plen 3\n"));
        assert!(text.contains("CSR: channel 21\n"));
    }

    #[test]
    fn test_acl_disabled_layer_still_advances() {
        // ACL header (handle 1, start flag) + L2CAP header + payload for a
        // channel bound to CAPI, with both L2CAP and CAPI output disabled
        let cfg = Config {
            filter: LayerFilter::HCI.with(LayerFilter::SDP),
            ..Config::default()
        };
        let mut d = Dissector::new(cfg, Vec::new());
        d.session_mut().bind_proto(1, 0x0041, ServiceProto::Capi);

        let data = [
            0x02, // ACL data
            0x01, 0x20, // handle 1, pb flag start
            0x0c, 0x00, // dlen
            0x08, 0x00, 0x41, 0x00, // L2CAP: len 8, cid 0x0041
            0x0a, 0x00, 0x01, 0x00, 0x05, 0x80, 0x01, 0x00, // CAPI header
        ];
        let mut frm = received(&data);
        d.dissect(&mut frm).unwrap();
        assert_eq!(frm.remaining(), 0);

        // Binding is still queryable afterwards
        assert_eq!(d.session().proto_for(1, 0x0041), Some(ServiceProto::Capi));

        let text = String::from_utf8(d.into_writer()).unwrap();
        assert_eq!(text, "> ACL data: handle 0x0001 flags 0x02 dlen 12\n");
    }

    #[test]
    fn test_sco_heading() {
        let data = [0x03, 0x05, 0x00, 0x02, 0x11, 0x22];
        let mut d = Dissector::new(Config::default(), Vec::new());
        d.dissect(&mut received(&data)).unwrap();

        let text = String::from_utf8(d.into_writer()).unwrap();
        assert_eq!(text, "> SCO data: handle 0x0005 dlen 2\n    11 22 \n");
    }

    #[test]
    fn test_truncated_frame_keeps_emitted_text() {
        // ACL header claims data but the capture stops mid-header
        let data = [0x02, 0x01];
        let mut d = Dissector::new(Config::default(), Vec::new());
        d.dissect(&mut received(&data)).unwrap();

        // Nothing was emitted, and the dissector is still usable
        let next = [0x04, 0x60, 0x00];
        d.dissect(&mut received(&next)).unwrap();
        let text = String::from_utf8(d.into_writer()).unwrap();
        assert_eq!(text, "> HCI Event: code 0x60 plen 0\n");
    }
}
