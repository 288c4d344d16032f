//! Logging setup and the run log handed to pipeline components.
//!
//! Events go to the console and to an append-mode log file. Components never
//! touch the global subscriber; they report through a [`RunLog`] owned by the
//! entry point.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Progress and failure sink for pipeline components.
pub trait RunLog {
    fn info(&self, msg: &str);
    fn error(&self, msg: &str, cause: &dyn std::error::Error);
}

/// [`RunLog`] backed by `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl RunLog for TracingLog {
    fn info(&self, msg: &str) {
        tracing::info!("{}", msg);
    }

    fn error(&self, msg: &str, cause: &dyn std::error::Error) {
        tracing::error!(error = %error_chain(cause), "{}", msg);
    }
}

/// `outer: inner: root` rendering of an error and its sources.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

/// Install the console and file layers.
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_tracing(level: &str, log_file: &Path) -> Result<()> {
    if let Some(dir) = log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file: {:?}", log_file))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}


#[cfg(test)]
pub(crate) mod test_support {
    use super::RunLog;
    use std::cell::RefCell;

    /// Collects messages so tests can assert on what a component reported.
    /// `events` keeps both levels in emission order.
    #[derive(Default)]
    pub struct MemoryLog {
        pub infos: RefCell<Vec<String>>,
        pub errors: RefCell<Vec<String>>,
        pub events: RefCell<Vec<String>>,
    }

    impl RunLog for MemoryLog {
        fn info(&self, msg: &str) {
            self.infos.borrow_mut().push(msg.to_string());
            self.events.borrow_mut().push(format!("INFO {}", msg));
        }

        fn error(&self, msg: &str, cause: &dyn std::error::Error) {
            let line = format!("{}: {}", msg, cause);
            self.events.borrow_mut().push(format!("ERROR {}", line));
            self.errors.borrow_mut().push(line);
        }
    }
}
