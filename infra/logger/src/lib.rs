//! # Logger
//!
//! Tracing setup shared by the Keepsafe binaries and tests.
//!
//! Console output goes to **stderr** so that command output on stdout stays
//! machine-readable. An optional rolling file sink writes through a
//! non-blocking worker; keep the returned [`Logger`] alive until shutdown.
//!
//! Log lines never carry secrets: callers log record ids, counts and error
//! kinds, never passwords or tokens.
//!
//! ```rust
//! # use ksafe_logger::{Logger, LevelFilter};
//! let _logger = Logger::builder()
//!     .name("ksafe")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod builder;
mod error;
mod filter;
mod sink;

pub use crate::builder::{FileOutput, LoggerBuilder, NoFileOutput, Named, Unnamed};
pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::filter::parse_level;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use tracing_appender::non_blocking::WorkerGuard;

/// Keeps the logging pipeline alive. Dropping it flushes and stops the file worker.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts configuring the global subscriber.
    ///
    /// ```rust
    /// use ksafe_logger::{LevelFilter, Logger};
    ///
    /// let _logger = Logger::builder().name("ksafe").level(LevelFilter::WARN).init().unwrap();
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// The file worker guard, present only when a log directory was configured.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }

    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.writes_files() {
            tracing::debug!("Flushing log files");
        }
    }
}
