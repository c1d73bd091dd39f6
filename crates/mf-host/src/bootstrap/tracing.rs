//! Tracing configuration for MemberFlow
//!
//! ## Behavior / 行为
//!
//! - **Filter**: `RUST_LOG` if set, else debug (dev) / info (prod) defaults
//! - **Outputs**: stdout, plus a daily rolling file under the data dir
//! - **`log` bridge**: records from crates using `log` are forwarded
//! - **Sentry**: error events are reported when `SENTRY_DSN` is set

use std::{fs, io, sync::OnceLock};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry};

use super::config::logs_dir;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static SENTRY_GUARD: OnceLock<sentry::ClientInitGuard> = OnceLock::new();

const LOG_FILE_PREFIX: &str = "memberflow.log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Default filter directives when `RUST_LOG` is not set.
fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let level = if is_dev { "debug" } else { "info" };
    vec![
        level.to_string(),
        format!("mf_app={level}"),
        format!("mf_infra={level}"),
        // Navigation state writes are chatty at debug.
        "mf_infra::navigation_store=info".to_string(),
        "sentry=warn".to_string(),
    ]
}

/// Initialize the tracing subscriber. Call once, before anything logs.
///
/// # Errors / 错误
///
/// Returns `Err` if a global subscriber or `log` logger is already installed.
pub fn init_tracing_subscriber() -> anyhow::Result<()> {
    let is_dev = is_development();

    let filter_directives = build_filter_directives(is_dev);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter_directives.join(",")));

    let sentry_layer = match std::env::var("SENTRY_DSN") {
        Ok(dsn) if !dsn.is_empty() => {
            let guard = sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    traces_sample_rate: 1.0,
                    ..Default::default()
                },
            ));
            if SENTRY_GUARD.set(guard).is_err() {
                eprintln!("Sentry guard already initialized");
            }
            Some(sentry_tracing::layer())
        }
        _ => None,
    };

    let stdout_writer: BoxMakeWriter = BoxMakeWriter::new(io::stdout);
    let file_writer = match build_file_writer() {
        Ok(writer) => Some(writer),
        Err(err) => {
            eprintln!("Failed to initialize file logging, falling back to stdout: {err}");
            None
        }
    };

    let stdout_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(stdout_writer);

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
            .with_level(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    // try_init also installs the `log` -> tracing bridge.
    registry()
        .with(env_filter)
        .with(sentry_layer)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn build_file_writer() -> anyhow::Result<NonBlocking> {
    let dir = logs_dir().ok_or_else(|| anyhow::anyhow!("No data directory for log files"))?;
    fs::create_dir_all(&dir)?;

    let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}
