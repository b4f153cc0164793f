//! Engine front door
//!
//! One [`Dissector`] per capture session: it owns the session state, the
//! configuration and the output sink, and runs each frame depth-first
//! through the layer chain. Dissection is synchronous and strictly
//! sequential; a frame is fully processed before the next is accepted, which
//! is what makes the shared mutable [`SessionState`] safe.

use std::io::Write;

use crate::config::{Config, LayerFilter};
use crate::frame::Frame;
use crate::layers;
use crate::output::OutputSink;
use crate::session::SessionState;
use crate::{DumpError, Result};

// ----------------------------------------------------------------------------
// Dissection Context
// ----------------------------------------------------------------------------

/// Everything a layer needs besides the frame itself
pub(crate) struct Ctx<'c, W: Write> {
    pub cfg: &'c Config,
    pub session: &'c mut SessionState,
    pub sink: &'c mut OutputSink<W>,
}

impl<W: Write> Ctx<'_, W> {
    /// Whether a layer may emit text
    pub fn enabled(&self, layer: LayerFilter) -> bool {
        self.cfg.filter.contains(layer)
    }
}

// ----------------------------------------------------------------------------
// Dissector
// ----------------------------------------------------------------------------

/// Per-session dissection engine
pub struct Dissector<W: Write> {
    cfg: Config,
    session: SessionState,
    sink: OutputSink<W>,
}

impl<W: Write> Dissector<W> {
    pub fn new(cfg: Config, out: W) -> Self {
        let sink = OutputSink::new(out, &cfg);
        Self {
            cfg,
            session: SessionState::new(),
            sink,
        }
    }

    /// Dissect one captured frame, emitting its text to the sink
    ///
    /// A truncated frame aborts that frame only: text already emitted for it
    /// stands and the session continues unaffected. I/O failures of the sink
    /// propagate.
    pub fn dissect(&mut self, frm: &mut Frame<'_>) -> Result<()> {
        self.sink.begin_frame();
        let mut ctx = Ctx {
            cfg: &self.cfg,
            session: &mut self.session,
            sink: &mut self.sink,
        };

        let res = if ctx.cfg.raw_only {
            ctx.sink.raw_dump(0, frm)
        } else {
            layers::hci::dissect(0, frm, &mut ctx)
        };

        match res {
            Err(DumpError::Truncated { needed, remaining }) => {
                tracing::debug!(needed, remaining, "frame truncated, dissection aborted");
            }
            other => other?,
        }
        self.sink.flush()
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Mutable session access for the external multiplexing collaborator
    /// (channel setup creates bindings, teardown removes them)
    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Consume the dissector, returning the underlying writer
    pub fn into_writer(self) -> W {
        self.sink.into_inner()
    }
}
