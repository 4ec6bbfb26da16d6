use crate::Logger;
use crate::error::LoggerError;
use crate::filter;
use crate::sink::{self, FileSink};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Builder state before the log name is set.
#[derive(Debug, Default)]
pub struct Unnamed;

/// Builder state carrying the log name, also used as the file prefix.
#[derive(Debug)]
pub struct Named(String);

/// No log directory configured.
#[derive(Debug, Default)]
pub struct NoFileOutput;

/// Rolling file output configured.
#[derive(Debug)]
pub struct FileOutput(FileSink);

mod sealed {
    pub trait Name {}
    impl Name for super::Unnamed {}
    impl Name for super::Named {}

    pub trait Output {}
    impl Output for super::NoFileOutput {}
    impl Output for super::FileOutput {}
}

/// Configures the global tracing subscriber. File-only knobs exist once a path is set.
#[derive(Debug)]
pub struct LoggerBuilder<N: sealed::Name = Unnamed, O: sealed::Output = NoFileOutput> {
    name: N,
    output: O,
    console: bool,
    level: LevelFilter,
    filter: Option<String>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            name: Unnamed,
            output: NoFileOutput,
            console: true,
            level: LevelFilter::INFO,
            filter: None,
        }
    }
}

impl<N: sealed::Name, O: sealed::Output> LoggerBuilder<N, O> {
    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Enables stderr output. On by default.
    #[must_use]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Explicit directives such as `ksafe_sync=debug,reqwest=info`.
    ///
    /// Overrides both `RUST_LOG` and the built-in dependency quieting.
    #[must_use]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

impl<O: sealed::Output> LoggerBuilder<Unnamed, O> {
    #[must_use]
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<Named, O> {
        LoggerBuilder {
            name: Named(name.into()),
            output: self.output,
            console: self.console,
            level: self.level,
            filter: self.filter,
        }
    }
}

impl<N: sealed::Name> LoggerBuilder<N, NoFileOutput> {
    /// Also writes rolling log files into `dir`.
    #[must_use]
    pub fn path(self, dir: impl Into<PathBuf>) -> LoggerBuilder<N, FileOutput> {
        LoggerBuilder {
            name: self.name,
            output: FileOutput(FileSink::new(dir.into())),
            console: self.console,
            level: self.level,
            filter: self.filter,
        }
    }
}

impl<N: sealed::Name> LoggerBuilder<N, FileOutput> {
    #[must_use]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.output.0.max_files = max;
        self
    }

    #[must_use]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.output.0.rotation = rotation;
        self
    }

    /// Writes file logs as JSON lines. Console output stays compact text.
    #[must_use]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.output.0.json = enabled;
        self
    }
}

impl LoggerBuilder<Named, NoFileOutput> {
    /// Installs a console-only subscriber.
    ///
    /// # Errors
    /// [`LoggerError::InvalidConfiguration`] for an empty name, a bad filter or with
    /// console output disabled; [`LoggerError::Subscriber`] if a global subscriber exists.
    pub fn init(self) -> Result<Logger, LoggerError> {
        install(&self.name.0, self.console, None, self.level, self.filter.as_deref())
    }
}

impl LoggerBuilder<Named, FileOutput> {
    /// Installs the subscriber with console and rolling file output.
    ///
    /// # Errors
    /// As for the console-only `init`, plus [`LoggerError::Appender`] or
    /// [`LoggerError::Internal`] when the log directory is unusable.
    pub fn init(self) -> Result<Logger, LoggerError> {
        install(&self.name.0, self.console, Some(self.output.0), self.level, self.filter.as_deref())
    }
}

fn install(
    name: &str,
    console: bool,
    file: Option<FileSink>,
    level: LevelFilter,
    filter: Option<&str>,
) -> Result<Logger, LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "logger name cannot be empty".into(),
            context: None,
        });
    }
    if !console && file.is_none() {
        return Err(LoggerError::InvalidConfiguration {
            message: "no output enabled; turn on the console or set a log directory".into(),
            context: None,
        });
    }

    let directives = filter::directives(level, filter)?;

    let mut layers = Vec::with_capacity(2);
    if console {
        layers.push(sink::console());
    }
    let guard = match file {
        Some(sink) => {
            let (layer, guard) = sink.open(name)?;
            layers.push(layer);
            Some(guard)
        },
        None => None,
    };

    tracing_subscriber::registry().with(directives).with(layers).try_init()?;

    Ok(Logger { guard })
}
