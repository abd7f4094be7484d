//! Resource catalog
//!
//! The catalog declares every resource mine installs, grouped by kind, plus
//! the version those resources make up together. A built-in catalog is
//! compiled into the binary; an override can be loaded from any structured
//! file [`mine_fs::ConfigStore`] understands.

use std::collections::HashSet;
use std::fmt;

use mine_fetch::join_locator;
use mine_fs::{ConfigStore, NormalizedPath, validate_relative_path};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const BUILTIN_CATALOG: &str = include_str!("default_catalog.toml");

/// Resource groups, each mapped to one directory under the base root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Workflows,
    Schemas,
    Templates,
    Skills,
}

impl GroupKind {
    pub const ALL: [GroupKind; 4] = [
        GroupKind::Workflows,
        GroupKind::Schemas,
        GroupKind::Templates,
        GroupKind::Skills,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workflows => "workflows",
            Self::Schemas => "schemas",
            Self::Templates => "templates",
            Self::Skills => "skills",
        }
    }

    /// Directory under the base root that holds this group.
    pub fn dest_dir(self) -> &'static str {
        match self {
            Self::Workflows => "global_workflows",
            Self::Schemas => "schemas",
            Self::Templates => "templates",
            Self::Skills => "skills",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tool-managed file. Identity is `(group, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceDescriptor {
    pub group: GroupKind,
    /// Path relative to the group, e.g. `plan.md` or `brainstorming/SKILL.md`
    pub name: String,
    pub source_locator: String,
    /// Path relative to the base root
    pub relative_dest_path: String,
    pub optional: bool,
    /// Skill bundle this file belongs to
    pub bundle: Option<String>,
}

impl ResourceDescriptor {
    pub fn identity(&self) -> (GroupKind, &str) {
        (self.group, &self.name)
    }

    /// The required file of a skill bundle.
    pub fn is_bundle_primary(&self) -> bool {
        self.bundle.is_some() && !self.optional
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// All resources of one kind and their destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    pub kind: GroupKind,
    /// Destination root relative to the base root
    pub dest_root: String,
    pub resources: Vec<ResourceDescriptor>,
}

/// On-disk catalog shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    pub version: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub kind: GroupKind,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default)]
    pub companions: Vec<String>,
}

fn default_primary() -> String {
    "SKILL.md".to_string()
}

/// A validated catalog with fully resolved source locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    version: String,
    source: String,
    groups: Vec<ResourceGroup>,
}

impl Catalog {
    /// The catalog shipped with this build.
    ///
    /// `source` replaces the catalog's own source when given.
    pub fn builtin(source: Option<&str>) -> Result<Self> {
        Self::from_toml(BUILTIN_CATALOG, source)
    }

    pub fn from_toml(content: &str, source: Option<&str>) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_file(file, source)
    }

    /// Load an override catalog from a `.toml`, `.json` or `.yaml` file.
    pub fn load(path: &NormalizedPath, source: Option<&str>) -> Result<Self> {
        let file: CatalogFile = ConfigStore::new().load(path)?;
        Self::from_file(file, source)
    }

    /// Validate a parsed catalog and expand it into descriptors.
    pub fn from_file(file: CatalogFile, source: Option<&str>) -> Result<Self> {
        let source = source.unwrap_or(&file.source).trim().to_string();
        if source.is_empty() {
            return Err(invalid("no resource source configured"));
        }
        if file.version.trim().is_empty() {
            return Err(invalid("version must not be empty"));
        }

        let mut seen = HashSet::new();
        let mut groups: Vec<ResourceGroup> = Vec::new();

        for entry in &file.groups {
            if entry.kind == GroupKind::Skills {
                return Err(invalid("skills are declared with [[skills]], not [[groups]]"));
            }
            let required = entry.resources.iter().map(|name| (name, false));
            let optional = entry.optional.iter().map(|name| (name, true));
            for (name, is_optional) in required.chain(optional) {
                let resource = describe(entry.kind, name, &source, is_optional, None)?;
                push_unique(&mut groups, &mut seen, resource)?;
            }
        }

        for skill in &file.skills {
            if skill.name.contains('/') {
                return Err(invalid(format!(
                    "skill name must be a single path segment: {}",
                    skill.name
                )));
            }
            validate_relative_path(&skill.name, "skill name").map_err(invalid)?;

            let files = std::iter::once((&skill.primary, false))
                .chain(skill.companions.iter().map(|name| (name, true)));
            for (file_name, is_optional) in files {
                let name = format!("{}/{}", skill.name, file_name);
                let resource = describe(
                    GroupKind::Skills,
                    &name,
                    &source,
                    is_optional,
                    Some(&skill.name),
                )?;
                push_unique(&mut groups, &mut seen, resource)?;
            }
        }

        groups.sort_by_key(|group| group.kind);
        tracing::debug!(
            version = %file.version,
            resources = seen.len(),
            "Loaded catalog"
        );

        Ok(Self {
            version: file.version.trim().to_string(),
            source,
            groups,
        })
    }

    /// Target version these resources make up.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn groups(&self) -> &[ResourceGroup] {
        &self.groups
    }

    /// Every descriptor across all groups.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.groups.iter().flat_map(|group| group.resources.iter())
    }

    /// Skill bundle names in declaration order.
    pub fn bundles(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for resource in self.resources() {
            if let Some(bundle) = resource.bundle.as_deref()
                && !names.contains(&bundle)
            {
                names.push(bundle);
            }
        }
        names
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidCatalog {
        message: message.into(),
    }
}

fn describe(
    kind: GroupKind,
    name: &str,
    source: &str,
    optional: bool,
    bundle: Option<&str>,
) -> Result<ResourceDescriptor> {
    validate_relative_path(name, &format!("{kind} resource name")).map_err(invalid)?;
    Ok(ResourceDescriptor {
        group: kind,
        name: name.to_string(),
        source_locator: join_locator(source, &format!("{}/{}", kind.as_str(), name)),
        relative_dest_path: format!("{}/{}", kind.dest_dir(), name),
        optional,
        bundle: bundle.map(str::to_string),
    })
}

fn push_unique(
    groups: &mut Vec<ResourceGroup>,
    seen: &mut HashSet<(GroupKind, String)>,
    resource: ResourceDescriptor,
) -> Result<()> {
    if !seen.insert((resource.group, resource.name.clone())) {
        return Err(invalid(format!("duplicate resource {resource}")));
    }
    match groups.iter_mut().find(|group| group.kind == resource.group) {
        Some(group) => group.resources.push(resource),
        None => groups.push(ResourceGroup {
            kind: resource.group,
            dest_root: resource.group.dest_dir().to_string(),
            resources: vec![resource],
        }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin(None).unwrap();
        assert_eq!(catalog.version(), "3.5.0");
        assert!(catalog.resources().any(|r| r.name == "plan.md"));
        assert_eq!(
            catalog.bundles(),
            vec!["brainstorming", "test-driven-development", "systematic-debugging"]
        );
    }

    #[test]
    fn source_override_rewrites_locators() {
        let catalog = Catalog::builtin(Some("/srv/mirror/")).unwrap();
        let plan = catalog.resources().find(|r| r.name == "plan.md").unwrap();
        assert_eq!(plan.source_locator, "/srv/mirror/workflows/plan.md");
        assert_eq!(plan.relative_dest_path, "global_workflows/plan.md");
    }

    #[test]
    fn skill_bundle_expansion() {
        let catalog = Catalog::builtin(Some("/m")).unwrap();
        let skill: Vec<_> = catalog
            .resources()
            .filter(|r| r.bundle.as_deref() == Some("brainstorming"))
            .collect();
        assert_eq!(skill.len(), 2);
        assert!(skill[0].is_bundle_primary());
        assert_eq!(skill[0].relative_dest_path, "skills/brainstorming/SKILL.md");
        assert_eq!(skill[0].source_locator, "/m/skills/brainstorming/SKILL.md");
        assert!(skill[1].optional);
    }
}
