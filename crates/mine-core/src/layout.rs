//! Install target layout
//!
//! Every path mine touches is derived from one base root by a fixed offset.
//! The shared instruction document and the preferences file sit one level
//! above the base root, next to it rather than inside it.

use mine_fs::NormalizedPath;

use crate::catalog::{GroupKind, ResourceDescriptor};

pub const VERSION_FILE: &str = "mine_version";
pub const LOCK_FILE: &str = ".mine.lock";
pub const MANAGED_DOCUMENT: &str = "global_rules.md";
pub const PREFERENCES_FILE: &str = "mine_preferences.json";

/// Resolved locations for one base root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    base_root: NormalizedPath,
}

impl InstallTarget {
    pub fn new(base_root: NormalizedPath) -> Self {
        Self { base_root }
    }

    pub fn base_root(&self) -> &NormalizedPath {
        &self.base_root
    }

    fn shared_root(&self) -> NormalizedPath {
        self.base_root
            .parent()
            .unwrap_or_else(|| self.base_root.clone())
    }

    pub fn group_root(&self, kind: GroupKind) -> NormalizedPath {
        self.base_root.join(kind.dest_dir())
    }

    /// Directory of one skill bundle.
    pub fn bundle_root(&self, bundle: &str) -> NormalizedPath {
        self.group_root(GroupKind::Skills).join(bundle)
    }

    pub fn destination(&self, resource: &ResourceDescriptor) -> NormalizedPath {
        self.base_root.join(&resource.relative_dest_path)
    }

    pub fn version_file(&self) -> NormalizedPath {
        self.base_root.join(VERSION_FILE)
    }

    pub fn lock_file(&self) -> NormalizedPath {
        self.base_root.join(LOCK_FILE)
    }

    pub fn managed_document(&self) -> NormalizedPath {
        self.shared_root().join(MANAGED_DOCUMENT)
    }

    pub fn preferences(&self) -> NormalizedPath {
        self.shared_root().join(PREFERENCES_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_offsets_from_base_root() {
        let target = InstallTarget::new(NormalizedPath::new("/home/u/.codeium/windsurf"));
        assert_eq!(
            target.group_root(GroupKind::Workflows).as_str(),
            "/home/u/.codeium/windsurf/global_workflows"
        );
        assert_eq!(
            target.version_file().as_str(),
            "/home/u/.codeium/windsurf/mine_version"
        );
        assert_eq!(
            target.managed_document().as_str(),
            "/home/u/.codeium/global_rules.md"
        );
        assert_eq!(
            target.preferences().as_str(),
            "/home/u/.codeium/mine_preferences.json"
        );
        assert_eq!(
            target.bundle_root("brainstorming").as_str(),
            "/home/u/.codeium/windsurf/skills/brainstorming"
        );
    }
}
