use crate::error::LoggerError;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::registry::LookupSpan;

const LOG_FILE_SUFFIX: &str = "log";

pub(crate) type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Where and how rolling log files are written.
#[derive(Debug)]
pub(crate) struct FileSink {
    pub(crate) dir: PathBuf,
    pub(crate) rotation: Rotation,
    pub(crate) max_files: usize,
    pub(crate) json: bool,
}

impl FileSink {
    pub(crate) const DEFAULT_MAX_FILES: usize = 10;

    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir, rotation: Rotation::DAILY, max_files: Self::DEFAULT_MAX_FILES, json: false }
    }

    /// Creates the directory and the appender. Nothing global is touched.
    pub(crate) fn open<S>(self, prefix: &str) -> Result<(BoxedLayer<S>, WorkerGuard), LoggerError>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        if self.max_files == 0 {
            return Err(LoggerError::InvalidConfiguration {
                message: "max_files must be greater than zero".into(),
                context: None,
            });
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| LoggerError::Internal {
            message: e.to_string().into(),
            context: Some(format!("cannot create log directory {}", self.dir.display()).into()),
        })?;

        let appender = RollingFileAppender::builder()
            .rotation(self.rotation)
            .filename_prefix(prefix)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(self.max_files)
            .build(&self.dir)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let plain = layer().with_writer(writer).with_ansi(false);
        let boxed = if self.json { plain.json().boxed() } else { plain.boxed() };
        Ok((boxed, guard))
    }
}

pub(crate) fn console<S>() -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    layer().compact().with_writer(std::io::stderr).with_ansi(true).boxed()
}
