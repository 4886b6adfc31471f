//! Stderr logger behind the `log` facade
//!
//! Warnings and errors are always shown. `--verbose` adds info and debug
//! lines from the dirmirror crates as `[verbose] ...`.

use log::{Level, LevelFilter, Log, Metadata, Record};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

/// Install the logger. Safe to call more than once; only the first call wins.
pub(crate) fn init(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(max_level(verbose));
    }
}

fn max_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// HTTP and runtime crates are chatty at debug level
fn is_own_target(target: &str) -> bool {
    target.starts_with("dm_")
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
            && (metadata.level() <= Level::Warn || is_own_target(metadata.target()))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error => eprintln!("Error: {}", record.args()),
            Level::Warn => eprintln!("Warning: {}", record.args()),
            _ => eprintln!("[verbose] {}", record.args()),
        }
    }

    fn flush(&self) {}
}
