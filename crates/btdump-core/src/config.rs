//! Dissection configuration
//!
//! All knobs are supplied by the embedding program (CLI parsing and capture
//! acquisition live outside this crate). A [`Config`] is fixed for the
//! lifetime of one [`Dissector`](crate::Dissector).

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Column count of the hex/ascii payload grids
pub const DUMP_WIDTH: usize = 20;

/// "Unassigned" manufacturer id, used until a real one is learned
pub const DEFAULT_COMPID: u16 = 65535;

// ----------------------------------------------------------------------------
// Payload Rendering
// ----------------------------------------------------------------------------

/// How undissected payload bytes are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadMode {
    /// Two-digit hex pairs
    #[default]
    Hex,
    /// Printable characters, dots for the rest
    Ascii,
    /// Suppress payload output entirely
    None,
}

// ----------------------------------------------------------------------------
// Layer Filter
// ----------------------------------------------------------------------------

/// Bitmask of protocol layers whose output is enabled
///
/// A disabled layer still consumes its own header bytes so deeper layers
/// stay byte-aligned; only its text is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerFilter(u32);

impl LayerFilter {
    pub const NONE: Self = Self(0);
    pub const HCI: Self = Self(0x0001);
    pub const SCO: Self = Self(0x0002);
    pub const L2CAP: Self = Self(0x0004);
    pub const RFCOMM: Self = Self(0x0008);
    pub const SDP: Self = Self(0x0010);
    pub const BNEP: Self = Self(0x0020);
    pub const CMTP: Self = Self(0x0040);
    pub const HIDP: Self = Self(0x0080);
    pub const CAPI: Self = Self(0x0001_0000);

    /// Every layer enabled
    pub const ALL: Self = Self(0x0001_00ff);

    /// Create a filter from raw bits
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Get the raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether any of `other`'s layers are enabled
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Enable the layers of `other`
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Disable the layers of `other`
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Check whether any layer beyond plain HCI is enabled
    ///
    /// Decides whether ACL data recurses into the multiplexing layer.
    pub const fn beyond_hci(self) -> bool {
        self.0 & !Self::HCI.0 != 0
    }
}

impl Default for LayerFilter {
    fn default() -> Self {
        Self::ALL
    }
}

// ----------------------------------------------------------------------------
// Config
// ----------------------------------------------------------------------------

/// Fixed per-session dissection options
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix the first line of every frame with its capture timestamp
    pub timestamps: bool,
    /// Rendering of raw/fallback payload bytes
    pub payload: PayloadMode,
    /// Skip layered dissection and dump every frame whole
    pub raw_only: bool,
    /// Enable field-level decoding in layers that gate on it (LMP)
    pub verbose: bool,
    /// Which layers may emit text
    pub filter: LayerFilter,
    /// Payload grid column count
    pub dump_width: usize,
    /// Manufacturer id assumed until one is learned from the capture
    pub default_manufacturer: u16,
    /// PSM assumed for data channels with no learned binding (0 = none)
    pub default_psm: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timestamps: false,
            payload: PayloadMode::Hex,
            raw_only: false,
            verbose: false,
            filter: LayerFilter::ALL,
            dump_width: DUMP_WIDTH,
            default_manufacturer: DEFAULT_COMPID,
            default_psm: 0,
        }
    }
}

impl Config {
    /// Config with field-level decoding enabled
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::default()
        }
    }

    /// Config that hex-dumps whole frames without layered dissection
    pub fn raw_only() -> Self {
        Self {
            raw_only: true,
            ..Self::default()
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_bit_operations() {
        let f = LayerFilter::HCI.with(LayerFilter::CAPI);
        assert!(f.contains(LayerFilter::HCI));
        assert!(f.contains(LayerFilter::CAPI));
        assert!(!f.contains(LayerFilter::SCO));

        let f = f.without(LayerFilter::CAPI);
        assert!(!f.contains(LayerFilter::CAPI));
    }

    #[test]
    fn test_beyond_hci() {
        assert!(!LayerFilter::HCI.beyond_hci());
        assert!(LayerFilter::HCI.with(LayerFilter::SCO).beyond_hci());
        assert!(LayerFilter::ALL.beyond_hci());
        assert!(!LayerFilter::NONE.beyond_hci());
    }

    #[test]
    fn test_all_covers_every_layer() {
        for layer in [
            LayerFilter::HCI,
            LayerFilter::SCO,
            LayerFilter::L2CAP,
            LayerFilter::RFCOMM,
            LayerFilter::SDP,
            LayerFilter::BNEP,
            LayerFilter::CMTP,
            LayerFilter::HIDP,
            LayerFilter::CAPI,
        ] {
            assert!(LayerFilter::ALL.contains(layer));
        }
    }
}
