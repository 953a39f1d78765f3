/*!
 * Virtual Path Module
 * Caller-visible paths and their confinement to capsule content
 */

pub mod bindings;
pub mod paths;
pub mod virtualizer;

// Re-exports
pub use bindings::{Binding, PathBindings};
pub use paths::{is_allowed_path_token, VirtualPath};
pub use virtualizer::{virtualize, PathVirtualizer, TraversalPolicy};
