//! Module and declaration types.
//!
//! These mirror the version-bearing parts of a build descriptor: the
//! module's own coordinate, its declared parent, dependencies, managed
//! dependencies, plugins and properties, each either at the top level or
//! inside a profile. Anything that cannot carry a version is left out.

use std::collections::BTreeMap;
use std::fmt;

use realign_version::{DEFAULT_TYPE, ProjectRef};
use serde::{Deserialize, Serialize};

/// Packaging of aggregator/parent modules.
pub const POM_PACKAGING: &str = "pom";

/// Group assumed for plugins that do not declare one.
pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

fn default_type() -> String {
    DEFAULT_TYPE.to_owned()
}

fn default_packaging() -> String {
    DEFAULT_TYPE.to_owned()
}

fn default_plugin_group() -> String {
    DEFAULT_PLUGIN_GROUP.to_owned()
}

// ---------------------------------------------------------------------------
// ModuleId
// ---------------------------------------------------------------------------

/// Index of a module inside its [`Reactor`](super::Reactor).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub usize);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A dependency or managed-dependency entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Dependency {
    /// A plain `jar` dependency.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: Option<&str>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.map(str::to_owned),
            kind: default_type(),
            classifier: None,
            scope: None,
        }
    }
}

/// A build plugin. Plugins carry a version and their own dependency list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    #[serde(default = "default_plugin_group")]
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

impl Plugin {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: Option<&str>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.map(str::to_owned),
            dependencies: Vec::new(),
        }
    }
}

/// The parts shared by a module and each of its profiles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelBase {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Plugin>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_plugins: Vec<Plugin>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// A named profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(flatten)]
    pub base: ModelBase,
}

/// The `<parent>` reference as declared. May point outside the reactor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentDecl {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl ParentDecl {
    #[must_use]
    pub fn project_ref(&self) -> ProjectRef {
        ProjectRef::new(&self.group_id, &self.artifact_id)
    }
}

// ---------------------------------------------------------------------------
// Declaration paths
// ---------------------------------------------------------------------------

/// Main model or a profile (by index into [`Module::profiles`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Main,
    Profile(usize),
}

/// Which collection of a [`ModelBase`] a declaration lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Dependencies,
    ManagedDependencies,
    Plugins,
    ManagedPlugins,
    /// Dependencies of the plugin at `plugin` in the plugins (or managed
    /// plugins) list.
    PluginDependencies { plugin: usize, managed: bool },
}

/// Stable address of one version-bearing declaration inside a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclarationPath {
    pub scope: Scope,
    pub section: Section,
    pub index: usize,
}

impl fmt::Display for DeclarationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Scope::Profile(p) = self.scope {
            write!(f, "profiles[{p}].")?;
        }
        match self.section {
            Section::Dependencies => write!(f, "dependencies[{}]", self.index),
            Section::ManagedDependencies => write!(f, "managedDependencies[{}]", self.index),
            Section::Plugins => write!(f, "plugins[{}]", self.index),
            Section::ManagedPlugins => write!(f, "managedPlugins[{}]", self.index),
            Section::PluginDependencies { plugin, managed } => {
                let list = if managed { "managedPlugins" } else { "plugins" };
                write!(f, "{list}[{plugin}].dependencies[{}]", self.index)
            }
        }
    }
}

/// An owned snapshot of one declaration, as written (not interpolated).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub path: DeclarationPath,
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub kind: String,
    pub classifier: Option<String>,
}

impl Declaration {
    fn from_dependency(path: DeclarationPath, d: &Dependency) -> Self {
        Self {
            path,
            group_id: d.group_id.clone(),
            artifact_id: d.artifact_id.clone(),
            version: d.version.clone(),
            kind: d.kind.clone(),
            classifier: d.classifier.clone(),
        }
    }

    fn from_plugin(path: DeclarationPath, p: &Plugin) -> Self {
        Self {
            path,
            group_id: p.group_id.clone(),
            artifact_id: p.artifact_id.clone(),
            version: p.version.clone(),
            kind: "maven-plugin".to_owned(),
            classifier: None,
        }
    }

    /// Returns `true` for plugin entries (as opposed to dependencies).
    #[must_use]
    pub const fn is_plugin(&self) -> bool {
        matches!(self.path.section, Section::Plugins | Section::ManagedPlugins)
    }
}

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

/// One module of the reactor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Own groupId; inherited from [`parent`](Self::parent) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub artifact_id: String,
    /// Own version; inherited from [`parent`](Self::parent) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default = "default_packaging")]
    pub packaging: String,
    /// Declared parent, possibly external to the reactor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentDecl>,
    /// The declared parent when it is itself a reactor module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_module: Option<ModuleId>,
    #[serde(flatten)]
    pub base: ModelBase,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
}

impl Module {
    /// A bare `jar` module with its own coordinate.
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: Some(group_id.to_owned()),
            artifact_id: artifact_id.to_owned(),
            version: Some(version.to_owned()),
            packaging: default_packaging(),
            parent: None,
            parent_module: None,
            base: ModelBase::default(),
            profiles: Vec::new(),
        }
    }

    /// GroupId as written, falling back to the declared parent's.
    #[must_use]
    pub fn raw_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Version as written, falling back to the declared parent's.
    #[must_use]
    pub fn raw_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.version.as_str()))
    }

    #[must_use]
    pub fn base(&self, scope: Scope) -> Option<&ModelBase> {
        match scope {
            Scope::Main => Some(&self.base),
            Scope::Profile(i) => self.profiles.get(i).map(|p| &p.base),
        }
    }

    pub fn base_mut(&mut self, scope: Scope) -> Option<&mut ModelBase> {
        match scope {
            Scope::Main => Some(&mut self.base),
            Scope::Profile(i) => self.profiles.get_mut(i).map(|p| &mut p.base),
        }
    }

    /// Every base in lookup order: main first, then profiles.
    pub fn bases(&self) -> impl Iterator<Item = (Scope, &ModelBase)> {
        std::iter::once((Scope::Main, &self.base)).chain(
            self.profiles
                .iter()
                .enumerate()
                .map(|(i, p)| (Scope::Profile(i), &p.base)),
        )
    }

    /// Every version-bearing declaration, in alignment order: managed
    /// dependencies and dependencies (main, then each profile), plugins and
    /// managed plugins (main, then each profile), then plugin dependencies.
    #[must_use]
    pub fn declarations(&self) -> Vec<Declaration> {
        let mut out = Vec::new();
        for (scope, base) in self.bases() {
            push_dependencies(&mut out, scope, Section::ManagedDependencies, &base.managed_dependencies);
            push_dependencies(&mut out, scope, Section::Dependencies, &base.dependencies);
        }
        for (scope, base) in self.bases() {
            push_plugins(&mut out, scope, Section::Plugins, &base.plugins);
            push_plugins(&mut out, scope, Section::ManagedPlugins, &base.managed_plugins);
        }
        for (scope, base) in self.bases() {
            for (managed, plugins) in [(false, &base.plugins), (true, &base.managed_plugins)] {
                for (plugin, p) in plugins.iter().enumerate() {
                    let section = Section::PluginDependencies { plugin, managed };
                    push_dependencies(&mut out, scope, section, &p.dependencies);
                }
            }
        }
        out
    }

    /// Only the dependency and managed-dependency declarations (main and
    /// profiles), in the same order as [`declarations`](Self::declarations).
    #[must_use]
    pub fn dependency_declarations(&self) -> Vec<Declaration> {
        let mut out = Vec::new();
        for (scope, base) in self.bases() {
            push_dependencies(&mut out, scope, Section::ManagedDependencies, &base.managed_dependencies);
            push_dependencies(&mut out, scope, Section::Dependencies, &base.dependencies);
        }
        out
    }

    /// Current version text of the declaration at `path`.
    #[must_use]
    pub fn declared_version(&self, path: &DeclarationPath) -> Option<&str> {
        let base = self.base(path.scope)?;
        match path.section {
            Section::Dependencies => base.dependencies.get(path.index)?.version.as_deref(),
            Section::ManagedDependencies => {
                base.managed_dependencies.get(path.index)?.version.as_deref()
            }
            Section::Plugins => base.plugins.get(path.index)?.version.as_deref(),
            Section::ManagedPlugins => base.managed_plugins.get(path.index)?.version.as_deref(),
            Section::PluginDependencies { plugin, managed } => {
                let plugins = if managed { &base.managed_plugins } else { &base.plugins };
                plugins
                    .get(plugin)?
                    .dependencies
                    .get(path.index)?
                    .version
                    .as_deref()
            }
        }
    }

    /// Replace the version text of the declaration at `path`, returning the
    /// previous text. `None` if the path does not exist.
    pub fn set_declared_version(
        &mut self,
        path: &DeclarationPath,
        version: &str,
    ) -> Option<Option<String>> {
        let base = self.base_mut(path.scope)?;
        let slot = match path.section {
            Section::Dependencies => &mut base.dependencies.get_mut(path.index)?.version,
            Section::ManagedDependencies => {
                &mut base.managed_dependencies.get_mut(path.index)?.version
            }
            Section::Plugins => &mut base.plugins.get_mut(path.index)?.version,
            Section::ManagedPlugins => &mut base.managed_plugins.get_mut(path.index)?.version,
            Section::PluginDependencies { plugin, managed } => {
                let plugins = if managed {
                    &mut base.managed_plugins
                } else {
                    &mut base.plugins
                };
                &mut plugins
                    .get_mut(plugin)?
                    .dependencies
                    .get_mut(path.index)?
                    .version
            }
        };
        Some(slot.replace(version.to_owned()))
    }

    /// Value of `name` declared directly in this module (main properties,
    /// then profile properties), with the scope that declares it.
    #[must_use]
    pub fn own_property(&self, name: &str) -> Option<(Scope, &str)> {
        self.bases()
            .find_map(|(scope, base)| base.properties.get(name).map(|v| (scope, v.as_str())))
    }

    /// Set property `name` in `scope`, returning the previous value. `None`
    /// if the scope does not exist.
    pub fn set_property(
        &mut self,
        scope: Scope,
        name: &str,
        value: &str,
    ) -> Option<Option<String>> {
        let base = self.base_mut(scope)?;
        Some(base.properties.insert(name.to_owned(), value.to_owned()))
    }

    /// Returns `true` for aggregator/parent modules.
    #[must_use]
    pub fn is_pom(&self) -> bool {
        self.packaging == POM_PACKAGING
    }
}

fn push_dependencies(
    out: &mut Vec<Declaration>,
    scope: Scope,
    section: Section,
    deps: &[Dependency],
) {
    out.extend(deps.iter().enumerate().map(|(index, d)| {
        Declaration::from_dependency(DeclarationPath { scope, section, index }, d)
    }));
}

fn push_plugins(out: &mut Vec<Declaration>, scope: Scope, section: Section, plugins: &[Plugin]) {
    out.extend(plugins.iter().enumerate().map(|(index, p)| {
        Declaration::from_plugin(DeclarationPath { scope, section, index }, p)
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Module {
        let mut m = Module::new("org.app", "core", "1.0");
        m.base.dependencies.push(Dependency::new("org.a", "a", Some("1.0")));
        m.base
            .managed_dependencies
            .push(Dependency::new("org.b", "b", Some("2.0")));
        let mut plugin = Plugin::new("org.p", "p", Some("3.0"));
        plugin.dependencies.push(Dependency::new("org.c", "c", Some("4.0")));
        m.base.plugins.push(plugin);
        m.profiles.push(Profile {
            id: "extra".to_owned(),
            base: ModelBase {
                dependencies: vec![Dependency::new("org.d", "d", None)],
                ..ModelBase::default()
            },
        });
        m
    }

    #[test]
    fn declarations_follow_alignment_order() {
        let names: Vec<String> = sample()
            .declarations()
            .into_iter()
            .map(|d| d.artifact_id)
            .collect();
        assert_eq!(names, ["b", "a", "d", "p", "c"]);
    }

    #[test]
    fn set_declared_version_round_trips_through_path() {
        let mut m = sample();
        let decls = m.declarations();
        let plugin_dep = decls
            .iter()
            .find(|d| d.artifact_id == "c")
            .map(|d| d.path)
            .unwrap();
        let old = m.set_declared_version(&plugin_dep, "4.0.redhat-1").unwrap();
        assert_eq!(old.as_deref(), Some("4.0"));
        assert_eq!(m.declared_version(&plugin_dep), Some("4.0.redhat-1"));
        assert_eq!(plugin_dep.to_string(), "plugins[0].dependencies[0]");
    }

    #[test]
    fn missing_path_is_none() {
        let mut m = sample();
        let path = DeclarationPath {
            scope: Scope::Profile(4),
            section: Section::Dependencies,
            index: 0,
        };
        assert!(m.set_declared_version(&path, "1").is_none());
    }

    #[test]
    fn inherits_group_and_version_from_declared_parent() {
        let mut m = sample();
        m.group_id = None;
        m.version = None;
        m.parent = Some(ParentDecl {
            group_id: "org.parent".to_owned(),
            artifact_id: "parent".to_owned(),
            version: "7".to_owned(),
        });
        assert_eq!(m.raw_group_id(), Some("org.parent"));
        assert_eq!(m.raw_version(), Some("7"));
    }

    #[test]
    fn module_json_uses_build_descriptor_names() {
        let json = r#"{
            "groupId": "org.app",
            "artifactId": "web",
            "version": "1.0",
            "packaging": "war",
            "dependencies": [{"groupId": "org.a", "artifactId": "a", "version": "${a.version}"}],
            "properties": {"a.version": "1.0"},
            "profiles": [{"id": "p1", "managedDependencies": []}]
        }"#;
        let m: Module = serde_json::from_str(json).unwrap();
        assert_eq!(m.packaging, "war");
        assert_eq!(m.base.dependencies[0].kind, "jar");
        assert_eq!(m.own_property("a.version"), Some((Scope::Main, "1.0")));
        assert_eq!(m.profiles[0].id, "p1");
    }
}
