//! Error types for the dissection engine
//!
//! Malformed input is almost never an error here: unknown opcodes, events and
//! packet types all degrade to raw rendering. The only true decode failure is
//! a cursor read that would run past the end of the captured frame.

// ----------------------------------------------------------------------------
// Error Type
// ----------------------------------------------------------------------------

/// Errors produced while dissecting a frame
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// A field read would exceed the bytes remaining in the current frame.
    ///
    /// This aborts dissection of the current frame only; whatever text was
    /// already emitted for it stands, and the stream continues with the next
    /// frame.
    #[error("truncated frame: needed {needed} more bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// Writing rendered text to the output sink failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

impl DumpError {
    /// Create a truncation error for a read of `needed` bytes
    pub(crate) fn truncated(needed: usize, remaining: usize) -> Self {
        DumpError::Truncated { needed, remaining }
    }

    /// Check whether this error is a frame truncation
    pub fn is_truncated(&self) -> bool {
        matches!(self, DumpError::Truncated { .. })
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, DumpError>;
