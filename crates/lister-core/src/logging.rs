use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Fetch counters for structured logging.
///
/// Tracks how runtime fetches ended so stale and cancelled traffic is visible.
/// All operations are atomic and lock-free.
#[derive(Debug, Default)]
pub struct RuntimeMetrics {
    fetches_started: AtomicU64,
    fetches_applied: AtomicU64,
    fetches_stale: AtomicU64,
    fetches_cancelled: AtomicU64,
    fetches_failed: AtomicU64,
}

impl RuntimeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_started(&self) {
        self.fetches_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fetch whose results were written to its session
    pub fn record_applied(&self) {
        self.fetches_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fetch that completed after being superseded
    pub fn record_stale(&self) {
        self.fetches_stale.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.fetches_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.fetches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn started(&self) -> u64 {
        self.fetches_started.load(Ordering::Relaxed)
    }

    pub fn applied(&self) -> u64 {
        self.fetches_applied.load(Ordering::Relaxed)
    }

    pub fn stale(&self) -> u64 {
        self.fetches_stale.load(Ordering::Relaxed)
    }

    pub fn cancelled(&self) -> u64 {
        self.fetches_cancelled.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.fetches_failed.load(Ordering::Relaxed)
    }

    /// Fraction of started fetches that were thrown away (0.0-100.0)
    pub fn wasted_rate(&self) -> f64 {
        let started = self.started();
        if started == 0 {
            0.0
        } else {
            ((self.stale() + self.cancelled()) as f64 / started as f64) * 100.0
        }
    }
}

/// Log runtime metrics at debug level.
///
/// Usage:
/// ```rust,ignore
/// log_runtime_metrics!(runtime.metrics(), "session_closed");
/// ```
#[macro_export]
macro_rules! log_runtime_metrics {
    ($metrics:expr, $name:expr) => {
        tracing::debug!(
            operation = $name,
            fetches_started = $metrics.started(),
            fetches_applied = $metrics.applied(),
            fetches_stale = $metrics.stale(),
            fetches_cancelled = $metrics.cancelled(),
            fetches_failed = $metrics.failed(),
            wasted_rate = $metrics.wasted_rate(),
            "runtime_metrics"
        );
    };
}

/// Helper macro for logging elapsed time at trace level.
///
/// Usage:
/// ```rust,ignore
/// let start = Instant::now();
/// // ... some work ...
/// trace_time!(start, "operation_name");
/// // Or with additional fields:
/// trace_time!(start, "operation_name", request_id = id.as_str());
/// ```
#[macro_export]
macro_rules! trace_time {
    ($start:expr, $name:expr) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $name);
    };
    ($start:expr, $name:expr $(, $field:ident = $value:expr)*) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $($field = $value),*, $name);
    };
}

/// Initialize structured logging based on CLI arguments
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let level = match (verbose, log_level) {
        (true, None) => "lister=debug,lister_core=debug",
        (false, None) => "lister=warn,lister_core=warn",
        (_, Some(level)) => return init_with_level(level, log_json),
    };

    init_with_level(level, log_json)
}

fn init_with_level(level: &str, log_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    // LISTER_LOG overrides the CLI level when RUST_LOG is unset
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("LISTER_LOG"))
        .unwrap_or_else(|_| {
            EnvFilter::new(if level.contains('=') {
                level.to_string()
            } else {
                format!("lister={level},lister_core={level}")
            })
        });

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_span_events(
                        tracing_subscriber::fmt::format::FmtSpan::NEW
                            | tracing_subscriber::fmt::format::FmtSpan::CLOSE,
                    ),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}
