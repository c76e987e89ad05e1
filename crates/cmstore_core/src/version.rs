//! Optimistic-concurrency version capability.

use crate::component::Component;

/// Capability for components carrying an optimistic-lock version.
///
/// The counter starts at 0 for new components and is bumped by the
/// backing store on every successful update. A persistence collaborator
/// can then detect "someone else updated this row since I loaded it"
/// purely from an in-memory comparison: two components with identical
/// attributes but different versions are shallow-equal and full-unequal.
///
/// Implementations must fold the version into `full_eq`/`full_hash` and
/// keep it out of `shallow_eq`/`shallow_hash`. The counter is unsigned,
/// so an out-of-range (negative) version is unrepresentable; XML decode
/// paths reject a negative or unparsable version attribute instead.
pub trait Versioned: Component {
    /// Returns the stored version counter.
    fn version(&self) -> u32;

    /// Sets the version counter.
    ///
    /// A changed value marks the component modified; setting the current
    /// value is a no-op.
    fn set_version(&mut self, version: u32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentEq, ComponentIdent, ComponentState};
    use crate::key::ComponentKey;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    #[derive(Debug, Clone)]
    struct Format {
        ident: ComponentIdent,
        name: String,
        version: u32,
    }

    impl Format {
        fn loaded(id: &str, name: &str, version: u32) -> Self {
            let key = ComponentKey::with_values(&["FORMATID"], &[id], false).unwrap();
            Self {
                ident: ComponentIdent::loaded(key, 0).unwrap(),
                name: name.to_string(),
                version,
            }
        }
    }

    impl Component for Format {
        const NODE_NAME: &'static str = "Format";

        fn ident(&self) -> &ComponentIdent {
            &self.ident
        }

        fn ident_mut(&mut self) -> &mut ComponentIdent {
            &mut self.ident
        }
    }

    // Full equality covers: key, name, version.
    impl ComponentEq for Format {
        fn full_eq(&self, other: &Self) -> bool {
            self.shallow_eq(other) && self.name == other.name && self.version == other.version
        }

        fn full_hash(&self) -> u64 {
            let mut hasher = DefaultHasher::new();
            self.key().hash(&mut hasher);
            self.name.hash(&mut hasher);
            self.version.hash(&mut hasher);
            hasher.finish()
        }
    }

    impl Versioned for Format {
        fn version(&self) -> u32 {
            self.version
        }

        fn set_version(&mut self, version: u32) {
            if self.version != version {
                self.version = version;
                self.ident.touch();
            }
        }
    }

    #[test]
    fn version_mismatch_is_full_unequal_but_shallow_equal() {
        let local = Format::loaded("3", "wide", 1);
        let mut remote = local.clone();
        remote.set_version(2);

        assert!(local.shallow_eq(&remote));
        assert!(!local.full_eq(&remote));
        assert_eq!(local.shallow_hash(), remote.shallow_hash());
    }

    #[test]
    fn set_version_marks_modified() {
        let mut format = Format::loaded("3", "wide", 1);
        format.set_version(2);
        assert_eq!(format.state(), ComponentState::Modified);

        let mut unchanged = Format::loaded("3", "wide", 1);
        unchanged.set_version(1);
        assert_eq!(unchanged.state(), ComponentState::Persisted);
    }

    #[test]
    fn equal_versions_are_full_equal() {
        let a = Format::loaded("3", "wide", 5);
        let b = Format::loaded("3", "wide", 5);
        assert!(a.full_eq(&b));
        assert_eq!(a.full_hash(), b.full_hash());
    }
}
