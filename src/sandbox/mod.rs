/*!
 * Sandbox Module
 * Execution environment construction for matched commands
 */

pub mod builder;
pub mod render;

pub use builder::{Action, LaunchSpec, SandboxBuilder, RENDER_BUILTIN};
pub use render::{RenderEnv, TemplateDocument};
