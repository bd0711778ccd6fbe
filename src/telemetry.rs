// SPDX-License-Identifier: MIT
//
// Logging setup for the demo.
//
// The terminal belongs to the UI, so log lines can't go to stdout or
// stderr. They go to the file named by `TERMAPP_LOG`, filtered by
// `RUST_LOG` (default `info`). With `TERMAPP_LOG` unset nothing is
// installed and every `tracing` macro is a no-op.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable naming the log file.
const LOG_ENV: &str = "TERMAPP_LOG";

/// Install the file logger if `TERMAPP_LOG` is set.
///
/// Returns the log path when logging is active. Failures to open the file
/// or install the subscriber leave logging off; the demo runs either way.
pub fn init(default_level: &str) -> Option<PathBuf> {
    let path = std::env::var_os(LOG_ENV).map(PathBuf::from)?;
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .ok()?;

    Some(path)
}
