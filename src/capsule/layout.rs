/*!
 * Capsule Layout
 * Well-known files and directories inside a capsule root
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HOST_FILE: &str = "host";
pub const COMMANDS_FILE: &str = "commands";
pub const GROUP_FILE: &str = "group";
pub const BINDINGS_FILE: &str = "bindings";
pub const CONTENT_DIR: &str = "content";
pub const BIN_DIR: &str = "bin";
pub const MAIN_DOCUMENT: &str = "main.gmi";

/// A tenant configuration root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capsule {
    root: PathBuf,
}

impl Capsule {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a configuration file directly under the root
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn host_file(&self) -> PathBuf {
        self.file(HOST_FILE)
    }

    pub fn group_file(&self) -> PathBuf {
        self.file(GROUP_FILE)
    }

    pub fn bindings_file(&self) -> PathBuf {
        self.file(BINDINGS_FILE)
    }

    /// Jail for `<path>` placeholders and working directory of commands
    pub fn content_dir(&self) -> PathBuf {
        self.root.join(CONTENT_DIR)
    }

    /// Executables here shadow system executables of the same name
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    pub fn main_document(&self) -> PathBuf {
        self.content_dir().join(MAIN_DOCUMENT)
    }
}
