/*!
 * Structured Tracing
 * Subscriber setup and per-session spans using the tracing crate
 *
 * Logs go to a server-side file by default: when the gateway runs as a
 * forced command, stdout and stderr belong to the remote caller.
 */

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use uuid::Uuid;

/// Where log output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    File(PathBuf),
    Off,
}

impl LogSink {
    /// Sink named by `CAPSULE_LOG_FILE`, or `default` when unset
    pub fn from_env(default: PathBuf) -> Self {
        Self::parse(std::env::var("CAPSULE_LOG_FILE").ok().as_deref(), default)
    }

    /// `-` is stderr, `off` disables logging, anything else names a file
    pub fn parse(value: Option<&str>, default: PathBuf) -> Self {
        match value.map(str::trim) {
            None | Some("") => LogSink::File(default),
            Some("-") => LogSink::Stderr,
            Some(v) if v.eq_ignore_ascii_case("off") => LogSink::Off,
            Some(path) => LogSink::File(PathBuf::from(path)),
        }
    }
}

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CAPSULE_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing(sink: LogSink) -> std::io::Result<()> {
    let writer = match sink {
        LogSink::Off => return Ok(()),
        LogSink::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogSink::File(path) => BoxMakeWriter::new(Mutex::new(open_log(&path)?)),
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("CAPSULE_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .ok();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .ok();
    }

    info!("Structured tracing initialized");
    Ok(())
}

fn open_log(path: &PathBuf) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Generate a unique session ID for log correlation
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one gateway session
pub struct SessionSpan {
    span: Span,
    start: Instant,
    session_id: String,
}

impl SessionSpan {
    pub fn new(identity: &str) -> Self {
        let session_id = generate_session_id();
        let span = span!(
            Level::INFO,
            "session",
            session_id = %session_id,
            identity = identity,
            capsule = tracing::field::Empty,
            exit_code = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            session_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Span handle for `Instrument`
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn record_capsule(&self, capsule: &str) {
        self.span.record("capsule", capsule);
    }

    pub fn record_exit(&self, code: i32) {
        self.span.record("exit_code", code);
    }
}

impl Drop for SessionSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();

        if duration.as_secs() > 60 {
            warn!(duration_ms = duration.as_millis() as u64, "long-running session");
        } else {
            info!(duration_ms = duration.as_millis() as u64, "session completed");
        }
    }
}
