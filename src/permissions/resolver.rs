/*!
 * Permission Resolver
 * Determines which command files a caller may draw from in a capsule
 */

use super::groups::groups_for;
use crate::capsule::layout::COMMANDS_FILE;
use crate::capsule::{Capsule, CapsuleStore};
use crate::commands::TemplateList;
use crate::core::types::Identity;
use tracing::{debug, warn};

/// One commands file in a permission set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateSource {
    /// The capsule's `commands` file, available to everyone
    Base,
    /// `commands-<group>`, available to group members
    Group(String),
}

impl TemplateSource {
    pub fn file_name(&self) -> String {
        match self {
            TemplateSource::Base => COMMANDS_FILE.to_string(),
            TemplateSource::Group(group) => format!("{}-{}", COMMANDS_FILE, group),
        }
    }
}

/// Ordered command files for one caller; earlier files are tried first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet {
    sources: Vec<TemplateSource>,
}

impl PermissionSet {
    pub fn base_only() -> Self {
        Self {
            sources: vec![TemplateSource::Base],
        }
    }

    pub fn sources(&self) -> &[TemplateSource] {
        &self.sources
    }

    /// Load every source's templates
    ///
    /// Missing or unreadable files contribute nothing; they are logged and
    /// skipped so later sources are still consulted.
    pub fn load<S: CapsuleStore + ?Sized>(&self, store: &S, capsule: &Capsule) -> Vec<TemplateList> {
        self.sources
            .iter()
            .filter_map(|source| {
                let name = source.file_name();
                match store.read_lines(&capsule.file(&name)) {
                    Ok(lines) => Some(TemplateList::parse(name, lines)),
                    Err(e) => {
                        warn!(file = %name, error = %e, "Commands file unavailable");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Resolve the permission set for `identity` within `capsule`
///
/// Always starts with the base file. A missing group file, or no line naming
/// the identity, yields the base file alone.
pub fn resolve_permissions<S: CapsuleStore + ?Sized>(
    store: &S,
    identity: &Identity,
    capsule: &Capsule,
) -> PermissionSet {
    let mut set = PermissionSet::base_only();

    let lines = match store.read_lines(&capsule.group_file()) {
        Ok(lines) => lines,
        Err(e) if e.is_not_found() => {
            debug!(capsule = %capsule.root().display(), "No group file");
            return set;
        }
        Err(e) => {
            warn!(error = %e, "Group file unreadable, granting base commands only");
            return set;
        }
    };

    if let Some(groups) = groups_for(identity, &lines) {
        debug!(groups = ?groups, "Identity has group membership");
        set.sources
            .extend(groups.into_iter().map(TemplateSource::Group));
    }

    set
}
