// SPDX-License-Identifier: MIT
//
// Terminal device capability.
//
// Everything the engine needs from the outside world goes through one trait:
// read the geometry, read and write the input mode, hand out a byte source
// for the key reader, and accept output bytes (`io::Write`). The real
// implementation talks termios and ioctl on a tty file; tests plug in the
// in-memory `MemoryDevice` instead.
//
// Safety: `TtyDevice` uses `unsafe` for termios (tcgetattr, tcsetattr),
// ioctl (TIOCGWINSZ), poll, and read on the raw fd. Each block wraps a
// single libc call on a descriptor owned by the device.
#![allow(unsafe_code)]

use std::io::{self, Read, Write};
use std::time::Duration;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Total number of cells (`cols × rows`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

// ─── Capability Traits ──────────────────────────────────────────────────────

/// A source of raw input bytes for the key reader thread.
pub trait ByteSource: Send + 'static {
    /// Wait up to `wait` for the next byte.
    ///
    /// Returns `Ok(None)` when nothing arrived in time, so the caller can
    /// check its stop flag. End of input is an error
    /// ([`io::ErrorKind::UnexpectedEof`]).
    ///
    /// # Errors
    ///
    /// Any read failure, including end of input.
    fn next_byte(&mut self, wait: Duration) -> io::Result<Option<u8>>;
}

/// The capabilities the engine needs from a terminal.
///
/// Output goes through the `io::Write` supertrait.
pub trait TerminalDevice: Write {
    /// A captured input-mode configuration.
    type Mode: Clone + Send;

    /// The byte source handed to the key reader.
    type Input: ByteSource;

    /// Current size in cells.
    ///
    /// # Errors
    ///
    /// Fails if the device can't report a usable size.
    fn size(&self) -> io::Result<Size>;

    /// Read the current input mode.
    ///
    /// # Errors
    ///
    /// Fails if the device is not a terminal or the query fails.
    fn get_mode(&self) -> io::Result<Self::Mode>;

    /// Apply an input mode.
    ///
    /// # Errors
    ///
    /// Fails if the device rejects the configuration.
    fn set_mode(&mut self, mode: &Self::Mode) -> io::Result<()>;

    /// Derive the raw version of `mode`: no line buffering, no echo, reads
    /// return after one byte with no inter-byte timeout.
    fn raw_mode(mode: &Self::Mode) -> Self::Mode;

    /// A byte source reading this device's input.
    ///
    /// # Errors
    ///
    /// Fails if the input side can't be duplicated.
    fn input(&self) -> io::Result<Self::Input>;
}

// ─── ReadSource ─────────────────────────────────────────────────────────────

/// A [`ByteSource`] over any blocking reader.
///
/// Ignores the wait hint: each call blocks until a byte arrives, so a
/// reader built on this only notices its stop flag between bytes. Useful
/// for pipes and canned input in tests.
pub struct ReadSource<R>(pub R);

impl<R: Read + Send + 'static> ByteSource for ReadSource<R> {
    fn next_byte(&mut self, _wait: Duration) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.0.read(&mut byte) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

// ─── TtyDevice ──────────────────────────────────────────────────────────────

#[cfg(unix)]
pub use tty::{PollSource, TtyDevice};

#[cfg(unix)]
mod tty {
    use std::fs::{File, OpenOptions};
    use std::io::{self, Write};
    use std::os::unix::io::AsRawFd;
    use std::time::Duration;

    use super::{ByteSource, Size, TerminalDevice};

    /// Path of the controlling terminal.
    const TTY_PATH: &str = "/dev/tty";

    /// A real terminal: termios and ioctl on an open tty file.
    pub struct TtyDevice {
        file: File,
    }

    impl TtyDevice {
        /// Open the controlling terminal (`/dev/tty`) for reading and writing.
        ///
        /// # Errors
        ///
        /// Fails if the process has no controlling terminal.
        pub fn open() -> io::Result<Self> {
            let file = OpenOptions::new().read(true).write(true).open(TTY_PATH)?;
            Ok(Self { file })
        }

        /// Wrap an already open terminal file.
        #[must_use]
        pub const fn from_file(file: File) -> Self {
            Self { file }
        }
    }

    impl TerminalDevice for TtyDevice {
        type Mode = libc::termios;
        type Input = PollSource;

        fn size(&self) -> io::Result<Size> {
            let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
            let result =
                unsafe { libc::ioctl(self.file.as_raw_fd(), libc::TIOCGWINSZ, &raw mut ws) };

            if result != 0 {
                return Err(io::Error::last_os_error());
            }
            if ws.ws_col == 0 || ws.ws_row == 0 {
                return Err(io::Error::other("terminal reported a zero size"));
            }
            Ok(Size {
                cols: ws.ws_col,
                rows: ws.ws_row,
            })
        }

        fn get_mode(&self) -> io::Result<libc::termios> {
            unsafe {
                let mut termios: libc::termios = std::mem::zeroed();
                if libc::tcgetattr(self.file.as_raw_fd(), &raw mut termios) != 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok(termios)
            }
        }

        fn set_mode(&mut self, mode: &libc::termios) -> io::Result<()> {
            if unsafe { libc::tcsetattr(self.file.as_raw_fd(), libc::TCSAFLUSH, mode) } != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }

        fn raw_mode(mode: &libc::termios) -> libc::termios {
            let mut raw = *mode;
            raw.c_lflag &= !(libc::ICANON | libc::ECHO);

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte available.
            raw.c_cc[libc::VMIN] = 1;
            raw.c_cc[libc::VTIME] = 0;
            raw
        }

        fn input(&self) -> io::Result<PollSource> {
            Ok(PollSource {
                file: self.file.try_clone()?,
            })
        }
    }

    impl Write for TtyDevice {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.file.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.file.flush()
        }
    }

    /// Tty input read one byte at a time, with `poll()` bounding each wait.
    pub struct PollSource {
        file: File,
    }

    impl ByteSource for PollSource {
        fn next_byte(&mut self, wait: Duration) -> io::Result<Option<u8>> {
            let fd = self.file.as_raw_fd();
            let timeout = i32::try_from(wait.as_millis()).unwrap_or(i32::MAX);

            let ready = unsafe {
                let mut pfd = libc::pollfd {
                    fd,
                    events: libc::POLLIN,
                    revents: 0,
                };
                libc::poll(&raw mut pfd, 1, timeout)
            };

            if ready == 0 {
                return Ok(None);
            }
            if ready < 0 {
                let err = io::Error::last_os_error();
                return if err.kind() == io::ErrorKind::Interrupted {
                    Ok(None)
                } else {
                    Err(err)
                };
            }

            let mut byte = 0u8;
            let n = unsafe { libc::read(fd, (&raw mut byte).cast(), 1) };
            match n {
                1 => Ok(Some(byte)),
                0 => Err(io::ErrorKind::UnexpectedEof.into()),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() == io::ErrorKind::Interrupted {
                        Ok(None)
                    } else {
                        Err(err)
                    }
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
