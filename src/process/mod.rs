/*!
 * Process Module
 * OS process launch for authorized commands
 */

pub mod launcher;

pub use launcher::{exit_code, ProcessLauncher};
