// SPDX-License-Identifier: MIT
//
// In-memory terminal device.
//
// A `TerminalDevice` with no tty behind it: output is captured in a byte
// vector, input is scripted through a channel, the "mode" is a small plain
// struct, and any capability can be told to fail. Cloning a MemoryDevice
// yields another handle onto the same state, so a test can give one clone
// to a `Terminal` and keep the other to feed keys and inspect output.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bitflags::bitflags;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::device::{ByteSource, Size, TerminalDevice};

bitflags! {
    /// Capabilities a [`MemoryDevice`] can be told to fail.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Fault: u8 {
        /// `size()` fails.
        const GEOMETRY     = 1 << 0;
        /// `get_mode()` fails.
        const MODE_QUERY   = 1 << 1;
        /// `set_mode()` fails when applying a raw mode.
        const MODE_SET     = 1 << 2;
        /// `set_mode()` fails when applying a non-raw (restoring) mode.
        const MODE_RESTORE = 1 << 3;
        /// `write()` fails.
        const WRITE        = 1 << 4;
    }
}

/// The fake terminal's input mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMode {
    /// Line buffering on.
    pub canonical: bool,
    /// Local echo on.
    pub echo: bool,
    /// Minimum bytes per read (VMIN).
    pub min_bytes: u8,
    /// Inter-byte timeout in deciseconds (VTIME).
    pub timeout: u8,
}

impl MemoryMode {
    /// A typical cooked terminal.
    pub const COOKED: Self = Self {
        canonical: true,
        echo: true,
        min_bytes: 1,
        timeout: 0,
    };

    /// Whether this mode is raw (no line buffering, no echo).
    #[must_use]
    pub const fn is_raw(self) -> bool {
        !self.canonical && !self.echo
    }
}

/// One scripted input item.
enum Input {
    Byte(u8),
    Fail(io::ErrorKind),
}

struct State {
    size: Size,
    mode: MemoryMode,
    mode_history: Vec<MemoryMode>,
    output: Vec<u8>,
    write_limit: Option<usize>,
    faults: Fault,
    input_tx: Option<Sender<Input>>,
}

/// An in-memory [`TerminalDevice`].
///
/// # Examples
///
/// ```
/// use termapp_term::memory::MemoryDevice;
/// use termapp_term::terminal::{SessionConfig, Terminal};
///
/// let device = MemoryDevice::new(20, 5);
/// let probe = device.clone();
///
/// let term = Terminal::open(device, SessionConfig::default()).unwrap();
/// assert!(probe.mode().is_raw());
/// term.close().unwrap();
/// assert!(!probe.mode().is_raw());
/// ```
#[derive(Clone)]
pub struct MemoryDevice {
    state: Arc<Mutex<State>>,
    input_rx: Receiver<Input>,
}

impl MemoryDevice {
    /// A cooked `cols × rows` terminal with no pending input.
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(Mutex::new(State {
                size: Size { cols, rows },
                mode: MemoryMode::COOKED,
                mode_history: Vec::new(),
                output: Vec::new(),
                write_limit: None,
                faults: Fault::empty(),
                input_tx: Some(tx),
            })),
            input_rx: rx,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Scripting ───────────────────────────────────────────────────────

    /// Make the given capabilities fail from now on.
    pub fn inject(&self, faults: Fault) {
        self.state().faults |= faults;
    }

    /// Stop failing the given capabilities.
    pub fn heal(&self, faults: Fault) {
        self.state().faults -= faults;
    }

    /// Accept at most `limit` bytes per `write` call (`None` = unlimited).
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.state().write_limit = limit;
    }

    /// Queue bytes as if typed at the keyboard.
    pub fn push_input(&self, bytes: &[u8]) {
        if let Some(tx) = &self.state().input_tx {
            for &b in bytes {
                let _ = tx.send(Input::Byte(b));
            }
        }
    }

    /// Queue a read failure after any pending input.
    pub fn fail_input(&self, kind: io::ErrorKind) {
        if let Some(tx) = &self.state().input_tx {
            let _ = tx.send(Input::Fail(kind));
        }
    }

    /// End the input stream; readers see end-of-file once it drains.
    pub fn close_input(&self) {
        self.state().input_tx = None;
    }

    // ─── Inspection ──────────────────────────────────────────────────────

    /// Everything written so far.
    #[must_use]
    pub fn output(&self) -> Vec<u8> {
        self.state().output.clone()
    }

    /// Everything written so far, as text (lossy).
    #[must_use]
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.state().output).into_owned()
    }

    /// Take and clear the captured output.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.state().output)
    }

    /// The current input mode.
    #[must_use]
    pub fn mode(&self) -> MemoryMode {
        self.state().mode
    }

    /// Every mode applied through `set_mode`, oldest first.
    #[must_use]
    pub fn mode_history(&self) -> Vec<MemoryMode> {
        self.state().mode_history.clone()
    }
}

impl TerminalDevice for MemoryDevice {
    type Mode = MemoryMode;
    type Input = MemoryInput;

    fn size(&self) -> io::Result<Size> {
        let state = self.state();
        if state.faults.contains(Fault::GEOMETRY) {
            return Err(io::Error::other("injected geometry fault"));
        }
        Ok(state.size)
    }

    fn get_mode(&self) -> io::Result<MemoryMode> {
        let state = self.state();
        if state.faults.contains(Fault::MODE_QUERY) {
            return Err(io::Error::other("injected mode query fault"));
        }
        Ok(state.mode)
    }

    fn set_mode(&mut self, mode: &MemoryMode) -> io::Result<()> {
        let mut state = self.state();
        let fault = if mode.is_raw() {
            Fault::MODE_SET
        } else {
            Fault::MODE_RESTORE
        };
        if state.faults.contains(fault) {
            return Err(io::Error::other("injected mode fault"));
        }
        state.mode = *mode;
        state.mode_history.push(*mode);
        Ok(())
    }

    fn raw_mode(_mode: &MemoryMode) -> MemoryMode {
        MemoryMode {
            canonical: false,
            echo: false,
            min_bytes: 1,
            timeout: 0,
        }
    }

    fn input(&self) -> io::Result<MemoryInput> {
        Ok(MemoryInput {
            rx: self.input_rx.clone(),
        })
    }
}

impl Write for MemoryDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state();
        if state.faults.contains(Fault::WRITE) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "injected write fault"));
        }
        let n = state.write_limit.map_or(buf.len(), |limit| buf.len().min(limit));
        state.output.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Input side of a [`MemoryDevice`].
pub struct MemoryInput {
    rx: Receiver<Input>,
}

impl ByteSource for MemoryInput {
    fn next_byte(&mut self, wait: Duration) -> io::Result<Option<u8>> {
        match self.rx.recv_timeout(wait) {
            Ok(Input::Byte(b)) => Ok(Some(b)),
            Ok(Input::Fail(kind)) => Err(kind.into()),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(io::ErrorKind::UnexpectedEof.into()),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
