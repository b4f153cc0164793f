//! Layered Bluetooth packet dissection
//!
//! This crate turns captured host/controller frames into structured,
//! indented text, the way an HCI sniffer log reads. Dissection starts at the
//! HCI packet-type byte and recurses downward (ACL to L2CAP to the bound
//! service protocol, vendor opcodes to manufacturer grammars to LMP), with
//! session state learned from earlier frames steering later ones.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod dissect;
pub mod errors;
pub mod frame;
pub mod output;
pub mod session;
pub mod tables;

mod layers;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::{Config, LayerFilter, PayloadMode};
pub use dissect::Dissector;
pub use errors::{DumpError, Result};
pub use frame::{Direction, Frame, Timestamp};
pub use session::{ServiceProto, SessionState};
