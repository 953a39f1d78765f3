/*!
 * Group Membership
 * Parses `<identity> group1 group2 ...` lines from a capsule group file
 */

use crate::core::types::Identity;
use tracing::warn;

/// Groups granted to `identity` by the first line naming it
///
/// A line applies when it begins with the full identity followed by
/// whitespace; a longer key that merely shares the prefix does not apply.
/// Scanning stops at the first applicable line. Group names that could not
/// safely form a `commands-<group>` file name are dropped.
pub fn groups_for<I, S>(identity: &Identity, lines: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ident = identity.as_str();
    if ident.is_empty() {
        return None;
    }

    for line in lines {
        let line = line.as_ref();
        if line.starts_with('#') {
            continue;
        }

        let Some(rest) = line.strip_prefix(ident) else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }

        let groups = rest
            .split_whitespace()
            .filter(|g| {
                let ok = is_valid_group_name(g);
                if !ok {
                    warn!(group = *g, "Ignoring invalid group name");
                }
                ok
            })
            .map(str::to_string)
            .collect();
        return Some(groups);
    }

    None
}

/// Group names become part of a file name inside the capsule root
pub fn is_valid_group_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
