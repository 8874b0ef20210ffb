//! Tracing subscriber setup.
//!
//! - Human-readable lines on stderr (stdout carries clipboard values when the
//!   stdio backend is used)
//! - An optional plain-text file in the configured log directory
//! - `RUST_LOG` overrides the default filter

use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const WORKSPACE_TARGETS: &[&str] = &[
    "tcpclipboard",
    "tcpclipboard_lib",
    "tc_core",
    "tc_network",
    "tc_app",
    "tc_platform",
];

fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Default filter: `info` globally, `debug` for our own crates in
/// development builds.
fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let own_level = if is_dev { "debug" } else { "info" };
    std::iter::once("info".to_string())
        .chain(
            WORKSPACE_TARGETS
                .iter()
                .map(|target| format!("{target}={own_level}")),
        )
        .collect()
}

/// Install the global subscriber. Call once, before anything logs.
///
/// A log directory that cannot be prepared is reported and skipped; only a
/// second registration is an error.
pub fn init_tracing_subscriber(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(build_filter_directives(is_development()).join(","))
    });

    let file_writer = match log_dir.map(build_file_writer).transpose() {
        Ok(writer) => writer,
        Err(err) => {
            eprintln!("Failed to initialize file logging, continuing without it: {err:#}");
            None
        }
    };

    let stderr_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(BoxMakeWriter::new(io::stderr));

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(
                "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            ))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn build_file_writer(log_dir: &Path) -> anyhow::Result<NonBlocking> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, "tcpclipboard.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}
