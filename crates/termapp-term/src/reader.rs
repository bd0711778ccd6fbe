// SPDX-License-Identifier: MIT
//
// Background key reader.
//
// A dedicated thread pulls bytes from the device one at a time, runs them
// through the `Decoder`, and sends finished keys down a bounded channel.
// The frame loop selects over that channel, its error channel, and its own
// timers, so rendering never waits on the keyboard.
//
// Shutdown: the source waits at most `poll_interval` per byte and reports
// "nothing yet" as `Ok(None)`, so the thread checks an `AtomicBool` stop
// flag between bytes. A full key channel is waited on the same way.
//
// Failure is terminal: the first read or decode error goes out once on the
// error channel and the thread exits. Both channels then disconnect.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, SendTimeoutError, Sender};
use tracing::{debug, warn};

use crate::device::ByteSource;
use crate::error::Error;
use crate::input::{Decoder, Key};

/// Name of the reader thread, as shown by debuggers and `top -H`.
const THREAD_NAME: &str = "termapp-keys";

/// Handle to the running key reader thread.
///
/// Stops the thread on [`stop`](Self::stop) or drop.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use std::time::Duration;
/// use termapp_term::device::ReadSource;
/// use termapp_term::input::Key;
/// use termapp_term::reader::KeyReader;
///
/// let source = ReadSource(Cursor::new(b"k\x1b[A".to_vec()));
/// let (reader, keys, _errors) =
///     KeyReader::spawn(source, 8, Duration::from_millis(10)).unwrap();
///
/// assert_eq!(keys.recv().unwrap(), Key::Byte(b'k'));
/// assert_eq!(keys.recv().unwrap(), Key::Up);
/// drop(reader);
/// ```
pub struct KeyReader {
    /// The thread handle. `None` after `stop()` joins it.
    handle: Option<JoinHandle<()>>,
    /// Shared flag telling the thread to exit.
    stop: Arc<AtomicBool>,
}

impl KeyReader {
    /// Spawn the reader thread over `source`.
    ///
    /// Returns the handle, the key receiver (bounded to `capacity`), and
    /// the error receiver, which yields at most one error.
    ///
    /// # Errors
    ///
    /// Fails if the OS refuses to spawn a thread.
    pub fn spawn<S: ByteSource>(
        source: S,
        capacity: usize,
        poll_interval: Duration,
    ) -> io::Result<(Self, Receiver<Key>, Receiver<Error>)> {
        let (key_tx, key_rx) = crossbeam_channel::bounded(capacity);
        let (err_tx, err_rx) = crossbeam_channel::bounded(1);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || {
                let worker = Worker {
                    keys: key_tx,
                    errors: err_tx,
                    stop: stop_flag,
                    poll_interval,
                };
                worker.run(source);
            })?;

        Ok((
            Self {
                handle: Some(handle),
                stop,
            },
            key_rx,
            err_rx,
        ))
    }

    /// Whether the thread has exited (stopped, or ended on an error).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signal the thread to stop and wait for it.
    ///
    /// Idempotent. Returns within about one poll interval for sources that
    /// honor the wait hint.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Worker ─────────────────────────────────────────────────────────────────

/// The thread side: owns the senders and the decoder.
struct Worker {
    keys: Sender<Key>,
    errors: Sender<Error>,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl Worker {
    fn stopping(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn run<S: ByteSource>(&self, mut source: S) {
        let mut decoder = Decoder::new();

        while !self.stopping() {
            let byte = match source.next_byte(self.poll_interval) {
                Ok(Some(b)) => b,
                Ok(None) => continue,
                Err(e) => return self.fail(Error::Io(e)),
            };

            match decoder.feed(byte) {
                Ok(decoded) => {
                    for key in decoded.keys() {
                        if !self.deliver(key) {
                            debug!("key reader exiting: channel closed or stop requested");
                            return;
                        }
                    }
                }
                Err(e) => return self.fail(e),
            }
        }
        debug!("key reader stopped");
    }

    /// Send one key, waiting out a full channel. `false` means give up.
    fn deliver(&self, key: Key) -> bool {
        let mut key = key;
        loop {
            match self.keys.send_timeout(key, self.poll_interval) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(k)) => {
                    if self.stopping() {
                        return false;
                    }
                    key = k;
                }
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }

    fn fail(&self, error: Error) {
        if self.stopping() {
            return;
        }
        warn!(op = error.operation(), %error, "key reader stopped on error");
        let _ = self.errors.try_send(error);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ReadSource, TerminalDevice};
    use crate::memory::MemoryDevice;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const POLL: Duration = Duration::from_millis(10);
    const WAIT: Duration = Duration::from_secs(2);

    fn spawn_memory(
        dev: &MemoryDevice,
        capacity: usize,
    ) -> (KeyReader, Receiver<Key>, Receiver<Error>) {
        KeyReader::spawn(dev.input().unwrap(), capacity, POLL).unwrap()
    }

    // ── Delivery ────────────────────────────────────────────────────────

    #[test]
    fn keys_arrive_in_order() {
        let dev = MemoryDevice::new(1, 1);
        let (_reader, keys, _errors) = spawn_memory(&dev, 16);

        dev.push_input(b"a\x1b[Bz\x1b[3~");
        let got: Vec<Key> = (0..4).map(|_| keys.recv_timeout(WAIT).unwrap()).collect();
        assert_eq!(got, vec![Key::Byte(b'a'), Key::Down, Key::Byte(b'z'), Key::Delete]);
    }

    #[test]
    fn sequence_split_across_reads() {
        let dev = MemoryDevice::new(1, 1);
        let (_reader, keys, _errors) = spawn_memory(&dev, 4);

        dev.push_input(&[0x1b]);
        assert!(keys.recv_timeout(POLL * 5).is_err());
        dev.push_input(b"[D");
        assert_eq!(keys.recv_timeout(WAIT).unwrap(), Key::Left);
    }

    #[test]
    fn backpressure_does_not_drop_keys() {
        let dev = MemoryDevice::new(1, 1);
        let (_reader, keys, _errors) = spawn_memory(&dev, 1);

        let input: Vec<u8> = (b'a'..=b'z').collect();
        dev.push_input(&input);
        thread::sleep(POLL * 3);

        let got: Vec<u8> = (0..input.len())
            .map(|_| match keys.recv_timeout(WAIT).unwrap() {
                Key::Byte(b) => b,
                other => panic!("unexpected key {other:?}"),
            })
            .collect();
        assert_eq!(got, input);
    }

    #[test]
    fn blocking_source_works() {
        let source = ReadSource(Cursor::new(b"\x1b[Hq".to_vec()));
        let (_reader, keys, errors) = KeyReader::spawn(source, 4, POLL).unwrap();

        assert_eq!(keys.recv_timeout(WAIT).unwrap(), Key::Home);
        assert_eq!(keys.recv_timeout(WAIT).unwrap(), Key::Byte(b'q'));
        // End of input is reported like any other read failure.
        let err = errors.recv_timeout(WAIT).unwrap();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    // ── Errors ──────────────────────────────────────────────────────────

    #[test]
    fn decode_error_is_reported_once() {
        let dev = MemoryDevice::new(1, 1);
        let (reader, keys, errors) = spawn_memory(&dev, 8);

        dev.push_input(b"x\x1b[Zy");
        assert_eq!(keys.recv_timeout(WAIT).unwrap(), Key::Byte(b'x'));
        assert!(matches!(errors.recv_timeout(WAIT).unwrap(), Error::Decode { byte: b'Z' }));

        // The thread is gone: no more keys, and both channels disconnect.
        assert!(keys.recv_timeout(WAIT).is_err());
        assert!(errors.recv_timeout(WAIT).is_err());
        drop(reader);
    }

    #[test]
    fn read_error_is_reported() {
        let dev = MemoryDevice::new(1, 1);
        let (_reader, _keys, errors) = spawn_memory(&dev, 8);

        dev.fail_input(io::ErrorKind::BrokenPipe);
        let err = errors.recv_timeout(WAIT).unwrap();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    // ── Shutdown ────────────────────────────────────────────────────────

    #[test]
    fn stop_joins_idle_thread() {
        let dev = MemoryDevice::new(1, 1);
        let (mut reader, keys, errors) = spawn_memory(&dev, 8);

        reader.stop();
        assert!(reader.is_finished());
        assert!(keys.recv_timeout(WAIT).is_err());
        assert!(errors.try_recv().is_err());
    }

    #[test]
    fn stop_is_idempotent() {
        let dev = MemoryDevice::new(1, 1);
        let (mut reader, _keys, _errors) = spawn_memory(&dev, 8);
        reader.stop();
        reader.stop();
    }

    #[test]
    fn stop_with_full_channel() {
        let dev = MemoryDevice::new(1, 1);
        let (mut reader, _keys, _errors) = spawn_memory(&dev, 1);

        dev.push_input(b"abc");
        thread::sleep(POLL * 3);
        reader.stop(); // Must not hang on the blocked send.
    }

    #[test]
    fn drop_stops_reader() {
        let dev = MemoryDevice::new(1, 1);
        let (reader, keys, _errors) = spawn_memory(&dev, 8);
        drop(reader);
        assert!(keys.recv_timeout(WAIT).is_err());
    }

    #[test]
    fn dropped_receiver_ends_thread() {
        let dev = MemoryDevice::new(1, 1);
        let (reader, keys, _errors) = spawn_memory(&dev, 8);
        drop(keys);

        dev.push_input(b"a");
        let deadline = std::time::Instant::now() + WAIT;
        while !reader.is_finished() && std::time::Instant::now() < deadline {
            thread::sleep(POLL);
        }
        assert!(reader.is_finished());
    }
}
