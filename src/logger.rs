use std::io::Write;
use std::time::Instant;

use log::{Level, Log, Metadata, Record};
use parking_lot::Mutex;

struct ShelldockLogger {
    file: Option<Mutex<std::fs::File>>,
    filter: log::LevelFilter,
    start: Instant,
}

impl Log for ShelldockLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!("{} {}", level_label(record.level()), record.args());

        if let Some(ref file) = self.file {
            let elapsed = self.start.elapsed().as_secs_f64();
            let _ = writeln!(
                file.lock(),
                "[{elapsed:.3}s] [{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "Error:",
        Level::Warn => "Warning:",
        Level::Info => "[info]",
        Level::Debug => "[debug]",
        Level::Trace => "[trace]",
    }
}

/// Install the global logger. Level comes from `RUST_LOG`, defaulting to warnings.
///
/// Records go to stderr, and also to `log_file` when one is given.
///
/// # Panics
///
/// Panics if called more than once.
pub fn init(log_file: Option<std::fs::File>) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(log::LevelFilter::Warn);

    let logger = ShelldockLogger {
        file: log_file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger)).expect("logger already initialized");
    log::set_max_level(filter);
}
