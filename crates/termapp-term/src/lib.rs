// SPDX-License-Identifier: MIT
//
// termapp-term — minimal terminal rendering engine.
//
// The caller describes the full screen it wants on every frame; the engine
// diffs that against what the terminal already shows and sends only the
// escape sequences for cells that changed. Meanwhile a background thread
// decodes raw keyboard bytes into keys and delivers them over a channel.
//
// One fixed escape dialect (VT100 cursor movement plus 24-bit SGR color),
// no terminfo, no external TUI framework. The terminal itself sits behind
// the `TerminalDevice` trait so the whole session runs against an in-memory
// device in tests.
//
//   Screen ──render──▶ DiffRenderer ──bytes──▶ OutputBuffer ──write──▶ device
//   device ──bytes──▶ KeyReader (thread) ──Decoder──▶ Receiver<Key>

pub mod ansi;
pub mod cell;
pub mod clock;
pub mod color;
pub mod device;
pub mod diff;
pub mod error;
pub mod input;
pub mod memory;
pub mod output;
pub mod raw;
pub mod reader;
pub mod screen;
pub mod terminal;

pub use cell::{Cell, Style};
pub use clock::FrameClock;
pub use color::Color;
pub use device::{Size, TerminalDevice};
pub use diff::RenderStats;
pub use error::{Error, Result};
pub use input::Key;
pub use screen::{Cursor, Screen};
pub use terminal::{SessionConfig, Terminal};
