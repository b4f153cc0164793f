//! L2CAP channel routing
//!
//! Only the basic four-byte header is decoded here; the payload of a data
//! channel is handed to whichever service protocol the session has bound to
//! that channel, falling back to the configured default PSM assumption.
//! Signalling traffic and unbound channels raw-render.

use std::io::Write;

use crate::config::LayerFilter;
use crate::dissect::Ctx;
use crate::frame::Frame;
use crate::layers::capi;
use crate::session::ServiceProto;
use crate::Result;

/// Connection-oriented signalling channel
const CID_SIGNALING: u16 = 0x0001;

pub(crate) fn dissect<W: Write>(
    level: usize,
    frm: &mut Frame<'_>,
    ctx: &mut Ctx<'_, W>,
) -> Result<()> {
    let dlen = frm.read_u16_le()?;
    let cid = frm.read_u16_le()?;
    frm.cid = cid;

    let enabled = ctx.enabled(LayerFilter::L2CAP);

    if cid == CID_SIGNALING {
        if !enabled {
            frm.take_remaining();
            return Ok(());
        }
        ctx.sink
            .line(level, frm, &format!("L2CAP(s): len {dlen} cid 0x{cid:04x}"))?;
        return ctx.sink.raw_dump(level + 1, frm);
    }

    if enabled {
        ctx.sink
            .line(level, frm, &format!("L2CAP(d): cid 0x{cid:04x} len {dlen}"))?;
    }

    let proto = ctx
        .session
        .proto_for(frm.handle, cid)
        .or_else(|| ServiceProto::from_psm(ctx.cfg.default_psm));

    match proto {
        Some(ServiceProto::Capi) => capi::dissect(level + 1, frm, ctx),
        _ => {
            if enabled {
                ctx.sink.raw_dump(level + 1, frm)
            } else {
                frm.take_remaining();
                Ok(())
            }
        }
    }
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

    fn run(cfg: &Config, session: &mut SessionState, handle: u16, data: &[u8]) -> String {
        let mut sink = OutputSink::new(Vec::new(), cfg);
        sink.begin_frame();
        let mut ctx = Ctx {
            cfg,
            session,
            sink: &mut sink,
        };
        let mut frm = Frame::new(data, Direction::Received, Timestamp::default());
        frm.handle = handle;
        dissect(0, &mut frm, &mut ctx).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    fn packet(dlen: u16, cid: u16, payload: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&dlen.to_le_bytes());
        v.extend_from_slice(&cid.to_le_bytes());
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn test_signaling_channel_raw_renders() {
        let cfg = Config::default();
        let mut session = SessionState::new();
        let data = packet(4, 0x0001, &[0x02, 0x01, 0x00, 0x00]);
        let text = run(&cfg, &mut session, 0x0042, &data);
        assert_eq!(
            text,
            "> L2CAP(s): len 4 cid 0x0001\n\
             \x20   02 01 00 00 \n"
        );
    }

    #[test]
    fn test_unbound_data_channel_raw_renders() {
        let cfg = Config::default();
        let mut session = SessionState::new();
        let data = packet(2, 0x0040, &[0xca, 0xfe]);
        let text = run(&cfg, &mut session, 0x0042, &data);
        assert_eq!(
            text,
            "> L2CAP(d): cid 0x0040 len 2\n\
             \x20   CA FE \n"
        );
    }

    #[test]
    fn test_bound_capi_channel_dispatches() {
        let cfg = Config::default();
        let mut session = SessionState::new();
        session.bind_proto(0x0042, 0x0040, ServiceProto::Capi);

        let mut capi = Vec::new();
        capi.extend_from_slice(&8u16.to_le_bytes());
        capi.extend_from_slice(&1u16.to_le_bytes());
        capi.push(0x01); // ALERT
        capi.push(0x83); // RESP
        capi.extend_from_slice(&5u16.to_le_bytes());
        let data = packet(capi.len() as u16, 0x0040, &capi);

        let text = run(&cfg, &mut session, 0x0042, &data);
        assert_eq!(
            text,
            "> L2CAP(d): cid 0x0040 len 8\n\
             \x20   CAPI_ALERT_RESP: appl 1 msgnum 5 len 0\n"
        );
    }

    #[test]
    fn test_default_psm_fallback() {
        // No binding, but a default PSM of 0x001f assumes CMTP; not CAPI,
        // so the payload raw-renders
        let cfg = Config {
            default_psm: 0x001f,
            ..Config::default()
        };
        let mut session = SessionState::new();
        let data = packet(1, 0x0040, &[0xaa]);
        let text = run(&cfg, &mut session, 0x0042, &data);
        assert_eq!(
            text,
            "> L2CAP(d): cid 0x0040 len 1\n\
             \x20   AA \n"
        );
    }

    #[test]
    fn test_disabled_layer_consumes_silently() {
        let cfg = Config {
            filter: LayerFilter::HCI,
            ..Config::default()
        };
        let mut session = SessionState::new();
        let data = packet(2, 0x0001, &[0x01, 0x02]);
        let text = run(&cfg, &mut session, 0x0042, &data);
        assert!(text.is_empty());
    }
}
