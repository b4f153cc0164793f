//! Vendor sub-dissector registry
//!
//! Vendor opcodes (the vendor command group with sub-opcode 0, and the
//! vendor-specific event code) carry a grammar defined by whichever
//! manufacturer built the controller. The id learned from the Read Local
//! Version reply selects the sub-dissector here; unknown manufacturers
//! degrade to raw rendering at the call site.

use std::io::Write;

use crate::dissect::Ctx;
use crate::frame::Frame;
use crate::layers::csr;
use crate::Result;

/// Cambridge Silicon Radio company id
pub(crate) const COMPID_CSR: u16 = 10;

type Layer<W> = fn(usize, &mut Frame<'_>, &mut Ctx<'_, W>) -> Result<()>;

/// Sub-dissector for a manufacturer id, if one is known
pub(crate) fn lookup<W: Write>(manufacturer: u16) -> Option<Layer<W>> {
    match manufacturer {
        COMPID_CSR => Some(csr::dissect::<W>),
        _ => None,
    }
}
