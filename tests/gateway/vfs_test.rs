/*!
 * Path Virtualizer Integration Tests
 * Containment of arbitrary caller paths
 */

use capsule_gate::vfs::{virtualize, Binding, PathBindings, PathVirtualizer, TraversalPolicy, VirtualPath};
use capsule_gate::PathError;
use proptest::prelude::*;
use std::path::{Path, PathBuf};

const JAIL: &str = "/srv/capsule/content";

fn segment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["..", ".", "", "a", "b", "etc", "passwd", "notes.gmi", "..."])
}

fn raw_path() -> impl Strategy<Value = String> {
    (any::<bool>(), prop::collection::vec(segment(), 1..10)).prop_map(|(absolute, segs)| {
        let joined = segs.join("/");
        if absolute {
            format!("/{}", joined)
        } else {
            joined
        }
    })
}

proptest! {
    #[test]
    fn prop_stripped_paths_stay_in_jail(raw in raw_path()) {
        if let Ok(real) = virtualize(&raw, Path::new(JAIL)) {
            prop_assert!(real.starts_with(JAIL), "{} escaped to {}", raw, real.display());
            prop_assert!(!real.components().any(|c| c == std::path::Component::ParentDir));
        }
    }

    #[test]
    fn prop_reject_policy_never_accepts_escape(raw in raw_path()) {
        let virt = PathVirtualizer::jailed(JAIL, TraversalPolicy::Reject);
        let attempted = VirtualPath::parse(&raw).map(|vp| vp.attempted_escape()).unwrap_or(false);
        match virt.virtualize(&raw) {
            Ok(real) => {
                prop_assert!(!attempted);
                prop_assert!(real.starts_with(JAIL));
            }
            Err(_) => {}
        }
    }

    #[test]
    fn prop_virtualized_paths_are_fixed_points(raw in raw_path()) {
        if let Ok(vp) = VirtualPath::parse(&raw) {
            let again = VirtualPath::parse(vp.as_str()).unwrap();
            prop_assert_eq!(again.as_path(), vp.as_path());
            prop_assert!(!again.attempted_escape());
        }
    }
}

#[test]
fn test_traversal_examples() {
    let jail = Path::new("/capsule/content");
    assert_eq!(
        virtualize("../../etc/passwd", jail).unwrap(),
        PathBuf::from("/capsule/content/etc/passwd")
    );
    assert_eq!(
        virtualize("/a/../../b", jail).unwrap(),
        PathBuf::from("/capsule/content/b")
    );
    assert_eq!(virtualize(".", jail).unwrap(), PathBuf::from("/capsule/content"));

    let virt = PathVirtualizer::jailed(jail, TraversalPolicy::Reject);
    assert!(matches!(
        virt.virtualize("../../etc/passwd"),
        Err(PathError::Traversal(_))
    ));
    assert!(matches!(virt.virtualize(""), Err(PathError::Empty)));
    assert!(matches!(
        virt.virtualize("a b"),
        Err(PathError::InvalidCharacters(_))
    ));
}

#[test]
fn test_longest_binding_wins() {
    let bindings = PathBindings::from_bindings(vec![
        Binding::new("/", "/data/root"),
        Binding::new("/fun", "/data/fun"),
        Binding::new("/fun/games", "/data/games"),
    ]);
    let virt = PathVirtualizer::new(bindings, TraversalPolicy::Reject);

    assert_eq!(virt.virtualize("/fun/games/chess").unwrap(), PathBuf::from("/data/games/chess"));
    assert_eq!(virt.virtualize("/fun/gamesx").unwrap(), PathBuf::from("/data/fun/gamesx"));
    assert_eq!(virt.virtualize("/fun").unwrap(), PathBuf::from("/data/fun"));
    assert_eq!(virt.virtualize("other").unwrap(), PathBuf::from("/data/root/other"));
}

#[test]
fn test_unbound_path_rejected() {
    let bindings = PathBindings::from_bindings(vec![Binding::new("/pub", "/data/pub")]);
    let virt = PathVirtualizer::new(bindings, TraversalPolicy::Reject);

    assert!(matches!(virt.virtualize("/private/key"), Err(PathError::Unbound(_))));
    assert!(matches!(virt.virtualize("/public"), Err(PathError::Unbound(_))));
}
