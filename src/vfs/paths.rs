/*!
 * Virtual Paths
 * Caller-visible path tokens, cleaned and forced absolute
 */

use crate::core::errors::{PathError, PathResult};
use std::path::{Component, Path, PathBuf};

/// Characters a `<path>` token may contain
///
/// Deliberately narrow: letters, digits, `-`, `.`, `/` and `_`.
pub fn is_allowed_path_token(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '/' | '_'))
}

/// A cleaned, absolute, caller-visible path
///
/// Construction strips every leading `..` that cleaning leaves behind, so the
/// stored path never climbs above `/`. The number of stripped segments is
/// kept so callers can decide whether an escape attempt should be refused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    path: PathBuf,
    stripped: usize,
}

impl VirtualPath {
    /// Validate and normalize a raw caller token
    pub fn parse(raw: &str) -> PathResult<Self> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        if !is_allowed_path_token(raw) {
            return Err(PathError::InvalidCharacters(raw.to_string()));
        }

        let cleaned = PathBuf::from(path_clean::clean(raw));

        let mut stripped = 0;
        let mut segments = Vec::new();
        for component in cleaned.components() {
            match component {
                Component::Normal(name) => segments.push(name),
                Component::ParentDir => {
                    if segments.pop().is_none() {
                        stripped += 1;
                    }
                }
                // Root and `.` carry no information once forced absolute
                _ => {}
            }
        }

        let mut path = PathBuf::from("/");
        for segment in segments {
            path.push(segment);
        }

        Ok(Self { path, stripped })
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Path text; always valid UTF-8 since tokens are ASCII
    pub fn as_str(&self) -> &str {
        self.path.to_str().unwrap_or("/")
    }

    /// Path without its leading `/`, ready to join under a root
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix("/").unwrap_or(&self.path)
    }

    /// Leading `..` segments removed during normalization
    pub fn stripped_segments(&self) -> usize {
        self.stripped
    }

    pub fn attempted_escape(&self) -> bool {
        self.stripped > 0
    }
}
