/*!
 * Monitoring
 * Structured logging for gateway sessions
 */

mod tracer;

pub use tracer::{generate_session_id, init_tracing, LogSink, SessionSpan};
