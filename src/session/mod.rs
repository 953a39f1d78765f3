/*!
 * Session Module
 * Per-session glue between the transport and the authorization engine
 */

pub mod orchestrator;
pub mod request;

pub use orchestrator::{Gateway, DEFAULT_HOST};
pub use request::{authenticated_identity, SessionRequest, SessionStreams};
