/*!
 * Permissions Module
 * Group membership and per-caller command file resolution
 *
 * Authentication is the transport's job; this module only decides which
 * operator-declared command files an identity may use.
 */

pub mod groups;
pub mod resolver;

pub use groups::{groups_for, is_valid_group_name};
pub use resolver::{resolve_permissions, PermissionSet, TemplateSource};
