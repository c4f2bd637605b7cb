use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Writer that pushes every write through to the underlying stream
/// immediately, so a supervisor reading our stdout sees lines as they happen.
pub struct FlushOnWrite<W: Write>(W);

impl<W: Write> FlushOnWrite<W> {
    pub fn new(inner: W) -> Self {
        Self(inner)
    }

    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> Write for FlushOnWrite<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.0.write(buf)?;
        self.0.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnbufferedStdout;

impl<'a> MakeWriter<'a> for UnbufferedStdout {
    type Writer = FlushOnWrite<io::StdoutLock<'static>>;

    fn make_writer(&'a self) -> Self::Writer {
        FlushOnWrite(io::stdout().lock())
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        "vacation_notifier=debug,info"
    } else {
        "vacation_notifier=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

pub fn init_logger(format: LogFormat, verbose: bool) {
    let registry = tracing_subscriber::registry().with(env_filter(verbose));

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(UnbufferedStdout)
                    .with_ansi(false)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(UnbufferedStdout)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(), // one object per line for log collectors
            )
            .init(),
    }
}
