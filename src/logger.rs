//! Minimal stderr backend for the `log` facade.
//!
//! Level comes from `SUNSHINE_LOG` (`error`, `warn`, `info`, `debug`, `trace`),
//! defaulting to `info`.

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable selecting the log level
pub const LOG_ENV: &str = "SUNSHINE_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Parse a level name, `None` if unrecognized.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}

/// Install the stderr logger. Safe to call more than once.
pub fn init() {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(LevelFilter::Info);

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
