// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Turns raw tty bytes into logical keys. The dialect is deliberately small:
// every byte is a key of its own, except `ESC [` followed by one terminator
// byte, which names a cursor or editing key.
//
//   Normal ──ESC──▶ Escape ──'['──▶ Csi ──terminator──▶ Normal (one special key)
//     ▲                │                     │
//     └── other byte: ESC and the byte, ─────┘ unknown terminator: Error::Decode
//         as two plain keys
//
// `ESC [ 3 ~` (delete) is the one four-byte form; after `3` the decoder
// waits for the `~`.
//
// The decoder is a pure state machine fed one byte at a time, so it can be
// tested without threads or a tty. The `reader` module drives it from a
// background thread.

use crate::error::{Error, Result};

/// The escape byte.
const ESC: u8 = 0x1b;

// ─── Key ────────────────────────────────────────────────────────────────────

/// A logical key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A plain byte, exactly as read (control characters included).
    Byte(u8),
    /// `ESC [ 3 ~`
    Delete,
    /// `ESC [ F`
    End,
    /// `ESC [ A`
    Up,
    /// `ESC [ B`
    Down,
    /// `ESC [ C`
    Right,
    /// `ESC [ D`
    Left,
    /// `ESC [ H`
    Home,
}

impl Key {
    /// First integer code used by special keys. Plain bytes use `0..=255`.
    pub const SPECIAL_BASE: u16 = 256;

    /// The key as a single integer: the byte value for plain keys, or
    /// [`SPECIAL_BASE`](Self::SPECIAL_BASE) upward for special keys.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Byte(b) => b as u16,
            Self::Delete => Self::SPECIAL_BASE,
            Self::End => Self::SPECIAL_BASE + 1,
            Self::Up => Self::SPECIAL_BASE + 2,
            Self::Down => Self::SPECIAL_BASE + 3,
            Self::Right => Self::SPECIAL_BASE + 4,
            Self::Left => Self::SPECIAL_BASE + 5,
            Self::Home => Self::SPECIAL_BASE + 6,
        }
    }

    /// Inverse of [`code`](Self::code).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Guarded by the range check.
    pub const fn from_code(code: u16) -> Option<Self> {
        if code < Self::SPECIAL_BASE {
            return Some(Self::Byte(code as u8));
        }
        match code - Self::SPECIAL_BASE {
            0 => Some(Self::Delete),
            1 => Some(Self::End),
            2 => Some(Self::Up),
            3 => Some(Self::Down),
            4 => Some(Self::Right),
            5 => Some(Self::Left),
            6 => Some(Self::Home),
            _ => None,
        }
    }

    /// The printable ASCII character this key types, if any.
    #[must_use]
    pub const fn printable(self) -> Option<char> {
        match self {
            Self::Byte(b) if b.is_ascii_graphic() || b == b' ' => Some(b as char),
            _ => None,
        }
    }

    /// Whether this is `Ctrl` + the given ASCII letter (e.g. `ctrl('c')`
    /// matches byte 3).
    #[must_use]
    pub const fn is_ctrl(self, letter: char) -> bool {
        match self {
            Self::Byte(b) => letter.is_ascii_alphabetic() && b == (letter as u8 & 0x1f),
            _ => false,
        }
    }

    /// The special key selected by a CSI terminator byte.
    const fn from_terminator(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Self::Up),
            b'B' => Some(Self::Down),
            b'C' => Some(Self::Right),
            b'D' => Some(Self::Left),
            b'H' => Some(Self::Home),
            b'F' => Some(Self::End),
            _ => None,
        }
    }
}

// ─── Decoded ────────────────────────────────────────────────────────────────

/// What one input byte produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Mid-sequence; nothing to deliver yet.
    Pending,
    /// One key.
    Key(Key),
    /// Two keys, in order (an `ESC` that did not start a sequence, then the
    /// byte after it).
    Pair(Key, Key),
}

impl Decoded {
    /// The produced keys, in delivery order.
    pub fn keys(self) -> impl Iterator<Item = Key> {
        let (first, second) = match self {
            Self::Pending => (None, None),
            Self::Key(k) => (Some(k), None),
            Self::Pair(a, b) => (Some(a), Some(b)),
        };
        first.into_iter().chain(second)
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Escape,
    Csi,
    /// Saw `ESC [ 3`, expecting `~`.
    CsiTilde,
}

/// Byte-at-a-time key decoder.
///
/// # Examples
///
/// ```
/// use termapp_term::input::{Decoded, Decoder, Key};
///
/// let mut decoder = Decoder::new();
/// assert_eq!(decoder.feed(0x1b).unwrap(), Decoded::Pending);
/// assert_eq!(decoder.feed(b'[').unwrap(), Decoded::Pending);
/// assert_eq!(decoder.feed(b'A').unwrap(), Decoded::Key(Key::Up));
/// ```
#[derive(Debug, Clone)]
pub struct Decoder {
    state: State,
}

impl Decoder {
    /// A decoder in the normal state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Normal,
        }
    }

    /// Whether a sequence is partially read.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state != State::Normal
    }

    /// Feed one byte.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] when the byte after `ESC [` is not a known
    /// terminator (or the byte after `ESC [ 3` is not `~`). The decoder
    /// returns to the normal state but makes no attempt to resynchronize.
    pub fn feed(&mut self, byte: u8) -> Result<Decoded> {
        let (next, out) = match self.state {
            State::Normal if byte == ESC => (State::Escape, Decoded::Pending),
            State::Normal => (State::Normal, Decoded::Key(Key::Byte(byte))),

            State::Escape if byte == b'[' => (State::Csi, Decoded::Pending),
            State::Escape => (State::Normal, Decoded::Pair(Key::Byte(ESC), Key::Byte(byte))),

            State::Csi if byte == b'3' => (State::CsiTilde, Decoded::Pending),
            State::Csi => match Key::from_terminator(byte) {
                Some(key) => (State::Normal, Decoded::Key(key)),
                None => {
                    self.state = State::Normal;
                    return Err(Error::Decode { byte });
                }
            },

            State::CsiTilde if byte == b'~' => (State::Normal, Decoded::Key(Key::Delete)),
            State::CsiTilde => {
                self.state = State::Normal;
                return Err(Error::Decode { byte });
            }
        };
        self.state = next;
        Ok(out)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
