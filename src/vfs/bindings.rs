/*!
 * Path Bindings
 * Longest-prefix routing of virtual paths onto real directories
 */

use super::paths::VirtualPath;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One `<virtual-prefix>:<real-dir>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub prefix: String,
    pub target: PathBuf,
}

impl Binding {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(prefix: S, target: P) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
        }
    }
}

/// Ordered set of bindings for one capsule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathBindings {
    bindings: Vec<Binding>,
}

impl PathBindings {
    /// Bind the whole virtual tree at `/` onto `root`
    pub fn single<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            bindings: vec![Binding::new("/", root)],
        }
    }

    pub fn from_bindings(bindings: Vec<Binding>) -> Self {
        Self { bindings }
    }

    /// Parse a bindings file
    ///
    /// Relative targets are taken relative to `base`. Malformed lines are
    /// logged and skipped.
    pub fn parse<I, S>(lines: I, base: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bindings = Vec::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(':').collect();
            if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
                warn!(entry = line, "Invalid entry in path bindings");
                continue;
            }

            bindings.push(Binding::new(parts[0], base.join(parts[1])));
        }
        Self { bindings }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Map a virtual path to a real path
    ///
    /// An exact key match wins outright; otherwise the longest key that is a
    /// whole-segment prefix of the path is used. Among equal-length keys the
    /// first declared wins.
    pub fn resolve(&self, path: &VirtualPath) -> Option<PathBuf> {
        let path = path.as_str();
        let mut best: Option<(&str, &Binding)> = None;

        for binding in &self.bindings {
            let key = binding.prefix.trim_end_matches('/');
            if path == binding.prefix || (!key.is_empty() && path == key) {
                return Some(binding.target.clone());
            }

            let bounded = format!("{}/", key);
            if !path.starts_with(bounded.as_str()) {
                continue;
            }

            let longer = best.map_or(true, |(k, _)| bounded.len() > k.len() + 1);
            if longer {
                best = Some((key, binding));
            }
        }

        best.map(|(key, binding)| {
            let rest = &path[key.len()..];
            binding.target.join(rest.trim_start_matches('/'))
        })
    }
}
