//! # Telemetry
//!
//! Structured logging setup and the per-request trace context. The trace id
//! assigned by the server middleware lives in a task-local for the duration
//! of the request, where the error envelope picks it up; the subscriber
//! itself is configured once from [`AppConfig`] (json in production, pretty
//! for local work).

use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::Layer,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::AppConfig;

/// Correlation metadata carried for one request.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

task_local! {
    static ACTIVE_TRACE_CONTEXT: TraceContext;
}

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the global subscriber once per process.
///
/// `RUST_LOG` wins over the configured level when set. Repeated calls are
/// no-ops so the binary and embedding tests can both call this freely.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    // Route legacy `log::` macros (the seed modules use them) through
    // tracing. A logger registered earlier keeps receiving them instead.
    let _ = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = if config.log_format == "pretty" {
        fmt::layer().pretty().boxed()
    } else {
        fmt::layer().json().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .inspect_err(|_| INSTALLED.store(false, Ordering::SeqCst))?;

    Ok(())
}

/// Run `future` with `context` visible through [`current_trace_id`].
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    ACTIVE_TRACE_CONTEXT.scope(context, future).await
}

/// Trace id of the enclosing request, if the current task is serving one.
pub fn current_trace_id() -> Option<String> {
    ACTIVE_TRACE_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .ok()
}
