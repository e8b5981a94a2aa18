use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Environment variable overriding the log level (`off`, `error`, … `trace`).
pub const LOG_ENV: &str = "TRANSLATE_LOG";

/// Writes `"[LEVEL] target: message"` lines to stderr.
///
/// Diagnostics go to stderr so that stdout carries only command output.
pub struct StderrLogger {
    max_level: LevelFilter,
}

impl StderrLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Pick the level from the `-v`/`-q` flags, unless [`LOG_ENV`] is set.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        let from_env = std::env::var(LOG_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<LevelFilter>().ok());

        let level = from_env.unwrap_or(match (quiet, verbose) {
            (true, _) => LevelFilter::Off,
            (false, 0) => LevelFilter::Warn,
            (false, 1) => LevelFilter::Info,
            (false, 2) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        });
        Self::new(level)
    }

    /// Call this once during start-up.
    #[allow(clippy::missing_errors_doc)]
    pub fn init(self) -> Result<(), SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Best-effort; a closed stderr must not abort a translation.
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
