//! Cross-frame session state
//!
//! Some facts are announced once in a capture but needed by many later,
//! unrelated frames: the local controller's manufacturer id (announced in a
//! single Read Local Version reply, consulted by every vendor frame) and the
//! protocol bound to each L2CAP channel (established by the control-plane
//! setup exchange, referenced by every data frame on that channel). One
//! [`SessionState`] holds both for the lifetime of one capture stream; two
//! independent streams must never share an instance.

use std::collections::HashMap;

// ----------------------------------------------------------------------------
// Service Protocols
// ----------------------------------------------------------------------------

/// Protocol identity of a multiplexed channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceProto {
    Sdp,
    Rfcomm,
    Bnep,
    Hidp,
    Cmtp,
    Capi,
}

impl ServiceProto {
    /// Map a well-known PSM to its protocol
    pub fn from_psm(psm: u16) -> Option<Self> {
        match psm {
            0x0001 => Some(ServiceProto::Sdp),
            0x0003 => Some(ServiceProto::Rfcomm),
            0x000f => Some(ServiceProto::Bnep),
            0x0011 | 0x0013 => Some(ServiceProto::Hidp),
            0x001f => Some(ServiceProto::Cmtp),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Session State
// ----------------------------------------------------------------------------

/// Mutable context shared by every frame of one capture session
#[derive(Debug, Default)]
pub struct SessionState {
    manufacturer: Option<u16>,
    protos: HashMap<(u16, u16), ServiceProto>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the manufacturer id from a Read Local Version reply
    ///
    /// Sticky once set; only a later instance of the same reply overwrites it.
    pub fn learn_manufacturer(&mut self, id: u16) {
        tracing::trace!(manufacturer = id, "learned local manufacturer");
        self.manufacturer = Some(id);
    }

    /// The learned manufacturer id, if any
    pub fn manufacturer(&self) -> Option<u16> {
        self.manufacturer
    }

    /// The learned manufacturer id, or `default` if none was seen yet
    pub fn manufacturer_or(&self, default: u16) -> u16 {
        self.manufacturer.unwrap_or(default)
    }

    /// Bind a (connection handle, PSM) channel to a protocol
    ///
    /// Called by the multiplexing layer's control-plane handling when a
    /// channel setup exchange establishes the channel's identity.
    pub fn bind_proto(&mut self, handle: u16, psm: u16, proto: ServiceProto) {
        tracing::trace!(handle, psm, ?proto, "channel bound");
        self.protos.insert((handle, psm), proto);
    }

    /// Protocol bound to a (connection handle, PSM) channel, if any
    pub fn proto_for(&self, handle: u16, psm: u16) -> Option<ServiceProto> {
        self.protos.get(&(handle, psm)).copied()
    }

    /// Remove a channel binding on teardown, returning what was bound
    pub fn unbind_proto(&mut self, handle: u16, psm: u16) -> Option<ServiceProto> {
        self.protos.remove(&(handle, psm))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
