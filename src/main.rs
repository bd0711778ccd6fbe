// SPDX-License-Identifier: MIT
//
// termapp — demo application for the termapp-term engine.
//
// Opens the controlling terminal, then loops:
//
//   redraw → wait for (key | reader error | 500ms tick) → update state
//
// The screen shows a rainbow "HELLO!" that cycles on every tick, the last
// key pressed, the frame rate, and the reader error if one arrived.
// `q` quits and gives the terminal back.
//
// Set `TERMAPP_LOG=/path/to/file` (and optionally `RUST_LOG`) to log.

mod telemetry;

use std::process;
use std::time::Duration;

use termapp_term::{Color, FrameClock, Key, Screen};

/// How often the rainbow advances.
const TICK: Duration = Duration::from_millis(500);

const RAINBOW: [Color; 6] = [
    Color::from_hex(0xff0000),
    Color::from_hex(0xffff00),
    Color::from_hex(0x00ff00),
    Color::from_hex(0x00ffff),
    Color::from_hex(0x0000ff),
    Color::from_hex(0xff00ff),
];

// ─── App State ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Hello {
    /// Last key pressed, if any.
    last: Option<Key>,
    /// Ticks elapsed; selects the rainbow phase.
    tick: usize,
    /// The key reader's error, once it has stopped.
    error: Option<String>,
}

impl Hello {
    /// What a key does. `false` means quit.
    fn on_key(&mut self, key: Key) -> bool {
        if key == Key::Byte(b'q') {
            return false;
        }
        self.last = Some(key);
        true
    }

    fn paint(&self, width: u16, height: u16, clock: &FrameClock) -> Screen {
        let mut screen = Screen::new(width, height);
        let cx = width / 2;
        let cy = height / 2;

        let status = format!("{} frames  {:.1} fps  q quits", clock.frames(), clock.fps());
        put(&mut screen, 0, 0, Color::BLACK, Color::WHITE, &status);

        if let Some(ch) = self.last.and_then(Key::printable) {
            put(&mut screen, cx, cy.saturating_sub(1), Color::BLACK, Color::WHITE, &ch.to_string());
        } else if let Some(key) = self.last {
            let label = format!("{key:?} ({})", key.code());
            put(&mut screen, cx, cy.saturating_sub(1), Color::BLACK, Color::WHITE, &label);
        }

        for (i, ch) in "HELLO!".chars().enumerate() {
            let back = RAINBOW[(self.tick + i) % RAINBOW.len()];
            let fore = RAINBOW[(self.tick + i + 3) % RAINBOW.len()];
            put(&mut screen, cx + i as u16, cy, back, fore, &ch.to_string());
        }

        for (i, ch) in "world".chars().enumerate() {
            let back = Color::from_hex(0x10_1010 * i as u32);
            put(&mut screen, cx + i as u16, cy + 1, back, Color::WHITE, &ch.to_string());
        }

        if let Some(error) = &self.error {
            put(&mut screen, 0, height - 1, Color::BLACK, Color::from_hex(0xff5555), error);
        }

        screen
    }
}

/// Write `text` at `(x, y)`, dropping whatever falls outside the screen.
fn put(screen: &mut Screen, x: u16, y: u16, back: Color, fore: Color, text: &str) {
    if y >= screen.height() || x >= screen.width() {
        return;
    }
    let room = usize::from(screen.width() - x);
    let clipped: String = text.chars().take(room).collect();
    screen.write(x, y, back, fore, &clipped);
}

// ─── Main Loop ──────────────────────────────────────────────────────────────

/// What woke the loop. `None` means that channel disconnected.
#[cfg(unix)]
enum Wake {
    Key(Option<Key>),
    Error(Option<termapp_term::Error>),
    Tick,
}

#[cfg(unix)]
fn run() -> termapp_term::Result<()> {
    use crossbeam_channel::{Receiver, select};
    use termapp_term::device::TtyDevice;
    use termapp_term::{SessionConfig, Terminal};

    let device = TtyDevice::open()?;
    let mut term = Terminal::open(device, SessionConfig::default())?;

    let mut app = Hello::default();
    let mut clock = FrameClock::new();
    let ticker = crossbeam_channel::tick(TICK);
    let mut keys: Receiver<Key> = term.keys().clone();
    let mut errors = term.errors().clone();

    let outcome = loop {
        if let Err(e) = term.redraw(|w, h| app.paint(w, h, &clock)) {
            break Err(e);
        }
        clock.tick();

        let wake = select! {
            recv(keys) -> key => Wake::Key(key.ok()),
            recv(errors) -> error => Wake::Error(error.ok()),
            recv(ticker) -> _ => Wake::Tick,
        };

        match wake {
            Wake::Key(Some(key)) => {
                if !app.on_key(key) {
                    break Ok(());
                }
            }
            // Reader gone; its error (if any) comes through `errors`.
            Wake::Key(None) => keys = crossbeam_channel::never(),
            Wake::Error(Some(error)) => app.error = Some(error.to_string()),
            Wake::Error(None) => errors = crossbeam_channel::never(),
            Wake::Tick => app.tick += 1,
        }
    };

    tracing::info!(frames = clock.frames(), elapsed = ?clock.elapsed(), "demo finished");
    let closed = term.close();
    outcome.and(closed)
}

#[cfg(not(unix))]
fn run() -> termapp_term::Result<()> {
    Err(std::io::Error::other("termapp needs a unix terminal").into())
}

fn main() {
    if let Some(path) = telemetry::init("info") {
        tracing::info!(log = %path.display(), "logging enabled");
    }

    if let Err(e) = run() {
        tracing::error!(error = %e, op = e.operation(), "demo failed");
        eprintln!("termapp: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
