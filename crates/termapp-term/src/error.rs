// SPDX-License-Identifier: MIT
//
// Error type shared by every fallible operation in the crate.
//
// Startup failures (geometry, mode query, mode set) abort session
// construction. Flush failures come back from `redraw`. Key reader
// failures (read errors, undecodable escapes) arrive once on the error
// channel. A failed mode restore is returned from `close`.

use std::io;

use thiserror::Error;

/// Terminal engine errors.
#[derive(Error, Debug)]
pub enum Error {
    /// The terminal size could not be determined at startup.
    #[error("failed to query terminal size: {0}")]
    Geometry(#[source] io::Error),

    /// Reading the current input mode failed (often: not a terminal).
    #[error("failed to read terminal mode: {0}")]
    ModeQuery(#[source] io::Error),

    /// Switching the terminal into raw mode failed.
    #[error("failed to enter raw mode: {0}")]
    ModeSet(#[source] io::Error),

    /// Restoring the captured input mode failed. The terminal is probably
    /// still raw.
    #[error("failed to restore terminal mode: {0}")]
    ModeRestore(#[source] io::Error),

    /// The key decoder met an escape sequence it does not know.
    #[error("unknown escape key: 0x{byte:02x}")]
    Decode {
        /// The unrecognized terminator byte.
        byte: u8,
    },

    /// Reading from or writing to the terminal device failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// The operation that failed, as a short lowercase label for logs.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Geometry(_) => "geometry",
            Self::ModeQuery(_) => "mode-query",
            Self::ModeSet(_) => "mode-set",
            Self::ModeRestore(_) => "mode-restore",
            Self::Decode { .. } => "decode",
            Self::Io(_) => "io",
        }
    }

    /// Whether this error ends the session before it started.
    #[must_use]
    pub const fn is_startup(&self) -> bool {
        matches!(self, Self::Geometry(_) | Self::ModeQuery(_) | Self::ModeSet(_))
    }
}

/// Shorthand for `Result<T, termapp_term::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

// ─── Tests ───────────────────────────────────────────────────────────────────
