//! Property-based tests for the dissection engine
//!
//! These tests verify the safety invariants that hold for arbitrary input:
//! dissection never panics, never reads past the captured bytes, and either
//! consumes a frame completely or aborts it as truncated.

use btdump_core::{Config, Direction, Dissector, Frame, LayerFilter, PayloadMode, Timestamp};
use proptest::prelude::*;

/// Generate arbitrary frame payloads, biased towards real packet types
fn arb_frame_data() -> impl Strategy<Value = Vec<u8>> {
    let ptype = prop_oneof![
        Just(0x01u8),
        Just(0x02u8),
        Just(0x03u8),
        Just(0x04u8),
        Just(0xffu8),
        any::<u8>(),
    ];
    (ptype, proptest::collection::vec(any::<u8>(), 0..64)).prop_map(|(t, mut body)| {
        body.insert(0, t);
        body
    })
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Sent), Just(Direction::Received)]
}

fn arb_config() -> impl Strategy<Value = Config> {
    (any::<bool>(), any::<bool>(), any::<u32>(), any::<u16>()).prop_map(
        |(timestamps, verbose, filter, default_psm)| Config {
            timestamps,
            verbose,
            filter: LayerFilter::new(filter),
            default_psm,
            ..Config::default()
        },
    )
}

proptest! {
    #[test]
    fn prop_dissection_never_panics(
        cfg in arb_config(),
        frames in proptest::collection::vec((arb_frame_data(), arb_direction()), 1..8),
    ) {
        let mut d = Dissector::new(cfg, Vec::new());
        for (data, direction) in &frames {
            let mut frm = Frame::new(data, *direction, Timestamp::default());
            // Truncation is absorbed; only sink I/O can fail, and a Vec never does
            d.dissect(&mut frm).unwrap();
        }
        // Whatever was emitted is valid UTF-8 text
        String::from_utf8(d.into_writer()).unwrap();
    }

    #[test]
    fn prop_cursor_never_overreads(data in arb_frame_data()) {
        let mut d = Dissector::new(Config::default(), Vec::new());
        let mut frm = Frame::new(&data, Direction::Received, Timestamp::default());
        d.dissect(&mut frm).unwrap();
        prop_assert!(frm.remaining() <= data.len());
    }

    #[test]
    fn prop_raw_only_consumes_everything(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut d = Dissector::new(Config::raw_only(), Vec::new());
        let mut frm = Frame::new(&data, Direction::Sent, Timestamp::default());
        d.dissect(&mut frm).unwrap();
        prop_assert_eq!(frm.remaining(), 0);
    }

    #[test]
    fn prop_payload_mode_changes_text_not_consumption(data in arb_frame_data()) {
        let mut consumed = Vec::new();
        for payload in [PayloadMode::Hex, PayloadMode::Ascii, PayloadMode::None] {
            let cfg = Config { payload, ..Config::default() };
            let mut d = Dissector::new(cfg, Vec::new());
            let mut frm = Frame::new(&data, Direction::Received, Timestamp::default());
            d.dissect(&mut frm).unwrap();
            consumed.push(frm.remaining());
        }
        prop_assert_eq!(consumed[0], consumed[1]);
        prop_assert_eq!(consumed[1], consumed[2]);
    }

    #[test]
    fn prop_lmp_short_opcode_survives_bit_packing(short in 0u8..=123, tid in 0u8..=1) {
        let mut d = Dissector::new(Config::default(), Vec::new());

        // Learn manufacturer 10, then feed an LMP PDU over the vendor channel
        let reply = [
            0x04, 0x0e, 0x0c, 0x01, 0x01, 0x10,
            0x00, 0x01, 0x29, 0x02, 0x01, 0x0a, 0x00, 0x33, 0x07,
        ];
        d.dissect(&mut Frame::new(&reply, Direction::Received, Timestamp::default())).unwrap();

        let cmd = [0x01, 0x00, 0xfc, 0x02, 0x03, (short << 1) | tid];
        d.dissect(&mut Frame::new(&cmd, Direction::Sent, Timestamp::default())).unwrap();

        let text = String::from_utf8(d.into_writer()).unwrap();
        let expected = format!("op code {short}\n");
        prop_assert!(text.contains(&expected));
    }
}
