//! Per-layer dissectors
//!
//! Each layer consumes exactly its own fixed header before delegating, so a
//! nested dissector always starts at byte 0 of its own payload. Unknown
//! codes degrade to raw rendering; the only failure a layer may return is a
//! truncated read or a sink write error.

pub(crate) mod capi;
pub(crate) mod csr;
pub(crate) mod hci;
pub(crate) mod l2cap;
pub(crate) mod lmp;
pub(crate) mod vendor;
