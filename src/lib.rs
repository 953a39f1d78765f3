/*!
 * Capsule Gate Library
 * Restricted remote-command gateway for multi-tenant content capsules
 */

pub mod capsule;
pub mod commands;
pub mod config;
pub mod core;
pub mod monitoring;
pub mod permissions;
pub mod process;
pub mod sandbox;
pub mod session;
pub mod vfs;

// Re-exports
pub use capsule::{scaffold_capsule, Capsule, CapsuleStore, FsCapsuleStore, MemoryCapsuleStore, TenantRouter};
pub use commands::{find_match, CommandTemplate, MatchedCommand, TemplateList};
pub use config::GatewayConfig;
pub use crate::core::errors::*;
pub use crate::core::types::{exit, CallerEnv, CommandVector, ExitStatus, Identity, NOT_FOUND_MESSAGE};
pub use monitoring::{init_tracing, LogSink, SessionSpan};
pub use permissions::{resolve_permissions, PermissionSet, TemplateSource};
pub use process::ProcessLauncher;
pub use sandbox::{Action, LaunchSpec, SandboxBuilder};
pub use session::{Gateway, SessionRequest, SessionStreams};
pub use vfs::{virtualize, PathBindings, PathVirtualizer, TraversalPolicy};
