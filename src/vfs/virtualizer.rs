/*!
 * Path Virtualizer
 * Maps caller path tokens into real paths confined to a capsule
 */

use super::bindings::PathBindings;
use super::paths::VirtualPath;
use crate::core::errors::{PathError, PathResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to do with a path whose leading `..` segments had to be stripped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalPolicy {
    /// Refuse the token; the template line does not match
    #[default]
    Reject,
    /// Keep the stripped path; it still resolves inside the root
    Strip,
}

impl std::str::FromStr for TraversalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(TraversalPolicy::Reject),
            "strip" => Ok(TraversalPolicy::Strip),
            other => Err(format!("unknown traversal policy: {}", other)),
        }
    }
}

/// Per-capsule path virtualizer
#[derive(Debug, Clone)]
pub struct PathVirtualizer {
    bindings: PathBindings,
    policy: TraversalPolicy,
}

impl PathVirtualizer {
    pub fn new(bindings: PathBindings, policy: TraversalPolicy) -> Self {
        Self { bindings, policy }
    }

    /// Confine every path under a single jail root
    pub fn jailed<P: Into<PathBuf>>(root: P, policy: TraversalPolicy) -> Self {
        Self::new(PathBindings::single(root), policy)
    }

    /// Virtualize a raw caller token into a real path
    pub fn virtualize(&self, raw: &str) -> PathResult<PathBuf> {
        let result = self.resolve(raw);
        if let Err(ref e) = result {
            debug!(path = raw, error = %e, "Path rejected");
        }
        result
    }

    /// Virtualize and return the real path as a command argument
    pub fn virtualize_arg(&self, raw: &str) -> PathResult<String> {
        let real = self.virtualize(raw)?;
        real.into_os_string()
            .into_string()
            .map_err(|os| PathError::NotUnicode(PathBuf::from(os)))
    }

    fn resolve(&self, raw: &str) -> PathResult<PathBuf> {
        let vpath = VirtualPath::parse(raw)?;

        if vpath.attempted_escape() && self.policy == TraversalPolicy::Reject {
            return Err(PathError::Traversal(raw.to_string()));
        }

        self.bindings
            .resolve(&vpath)
            .ok_or_else(|| PathError::Unbound(vpath.as_str().to_string()))
    }
}

/// Virtualize `raw` under `jail_root`, stripping escape segments
pub fn virtualize(raw: &str, jail_root: &Path) -> PathResult<PathBuf> {
    PathVirtualizer::jailed(jail_root, TraversalPolicy::Strip).virtualize(raw)
}
