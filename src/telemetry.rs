//! Tracing setup for the `kanban` binary.
//!
//! Events go to stderr in the configured format. When a log directory is
//! configured they are also written to a daily-rolling file there; the
//! returned [`TelemetryGuard`] must be held until exit so buffered lines
//! are flushed.

use std::path::Path;

use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{LogFormat, Settings};

const LOG_FILE_PREFIX: &str = "kanban.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub struct TelemetryGuard {
    _guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(settings: &Settings) -> TelemetryGuard {
    let filter = build_filter(&settings.log_filter());
    let format = settings.file.logging.format;

    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = vec![build_stderr_layer(format)];

    let mut file_setup_error = None;
    if let Some(dir) = settings.log_dir() {
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let (layer, guard) = build_file_layer(format, &dir);
                layers.push(layer);
                guards.push(guard);
            }
            Err(err) => {
                file_setup_error =
                    Some(format!("log dir init failed for {}: {err}", dir.display()));
            }
        }
    }

    layers.push(Box::new(filter));

    // A subscriber may already be installed when embedded; keep it.
    let _ = Registry::default().with(layers).try_init();

    if let Some(error) = file_setup_error {
        tracing::warn!("{error}");
    }

    TelemetryGuard { _guards: guards }
}

fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn build_stderr_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Pretty => Box::new(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true),
        ),
    }
}

fn build_file_layer(
    format: LogFormat,
    dir: &Path,
) -> (BoxedLayer, tracing_appender::non_blocking::WorkerGuard) {
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer: BoxedLayer = match format {
        LogFormat::Pretty => Box::new(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true),
        ),
    };
    (layer, guard)
}
