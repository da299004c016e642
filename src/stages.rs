//! The smaller pipeline stages: property injection, plugin and profile
//! removal, and `${project.version}` enforcement.

use std::collections::{BTreeMap, BTreeSet};

use realign_version::ProjectRef;

use crate::config::{ConfigError, RemovalConfig};
use crate::error::AlignError;
use crate::model::{ModelBase, ModuleId, Plugin, Reactor, Scope, interpolate};
use crate::report::{ChangeTarget, Report};

const PROJECT_VERSION_REF: &str = "${project.version}";

// ---------------------------------------------------------------------------
// property-injection
// ---------------------------------------------------------------------------

/// Write remote property overrides into the execution root's main
/// properties. Returns the number of properties changed.
#[tracing::instrument(skip_all, fields(properties = properties.len()))]
pub fn inject_properties(reactor: &mut Reactor, properties: &BTreeMap<String, String>, report: &mut Report) -> usize {
    let root = reactor.execution_root();
    let root_ga = reactor.project_ref(root);
    let mut changed = 0;
    for (name, value) in properties {
        let base = &mut reactor.module_mut(root).base;
        let old = base.properties.insert(name.clone(), value.clone());
        if old.as_deref() == Some(value.as_str()) {
            continue;
        }
        report.record_change(
            root,
            &root_ga,
            ChangeTarget::Property { name: name.clone() },
            old,
            Some(value.clone()),
        );
        changed += 1;
    }
    changed
}

// ---------------------------------------------------------------------------
// plugin-removal / profile-removal
// ---------------------------------------------------------------------------

/// Remove every plugin and managed plugin (main and profiles) whose GA is
/// listed in `removal.plugins`.
///
/// # Errors
/// Returns [`AlignError::Config`] if a listed plugin is not a
/// `group:artifact` pair.
#[tracing::instrument(skip_all, fields(plugins = removal.plugins.len()))]
pub fn remove_plugins(reactor: &mut Reactor, removal: &RemovalConfig, report: &mut Report) -> Result<usize, AlignError> {
    let targets = removal
        .plugins
        .iter()
        .map(|s| {
            ProjectRef::parse(s).map_err(|e| {
                AlignError::Config(ConfigError::new(format!("removal.plugins: `{s}`: {e}")))
            })
        })
        .collect::<Result<BTreeSet<_>, _>>()?;
    if targets.is_empty() {
        return Ok(0);
    }

    let mut removed = 0;
    for id in reactor.ids().collect::<Vec<_>>() {
        let module_ga = reactor.project_ref(id);
        let scopes: Vec<Scope> = reactor.module(id).bases().map(|(scope, _)| scope).collect();
        for scope in scopes {
            let gone = remove_from_base(reactor, id, scope, &targets);
            for ga in gone {
                tracing::info!(module = %module_ga, plugin = %ga, "removed plugin");
                report.record_change(id, &module_ga, ChangeTarget::RemovedPlugin { ga }, None, None);
                removed += 1;
            }
        }
    }
    Ok(removed)
}

fn remove_from_base(reactor: &mut Reactor, id: ModuleId, scope: Scope, targets: &BTreeSet<ProjectRef>) -> Vec<ProjectRef> {
    let Some(base) = reactor.module(id).base(scope) else {
        return Vec::new();
    };
    let plugin_ga = |p: &Plugin| {
        ProjectRef::new(
            interpolate::resolve(reactor, id, &p.group_id),
            interpolate::resolve(reactor, id, &p.artifact_id),
        )
    };
    let keep_plugins: Vec<bool> = base.plugins.iter().map(|p| !targets.contains(&plugin_ga(p))).collect();
    let keep_managed: Vec<bool> = base
        .managed_plugins
        .iter()
        .map(|p| !targets.contains(&plugin_ga(p)))
        .collect();
    if keep_plugins.iter().chain(&keep_managed).all(|&k| k) {
        return Vec::new();
    }

    let Some(base) = reactor.module_mut(id).base_mut(scope) else {
        return Vec::new();
    };
    let mut gone = Vec::new();
    gone.extend(drain_plugins(&mut base.plugins, &keep_plugins));
    gone.extend(drain_plugins(&mut base.managed_plugins, &keep_managed));
    gone
}

fn drain_plugins(plugins: &mut Vec<Plugin>, keep: &[bool]) -> Vec<ProjectRef> {
    let mut gone = Vec::new();
    let mut flags = keep.iter();
    plugins.retain(|p| {
        let kept = flags.next().copied().unwrap_or(true);
        if !kept {
            gone.push(ProjectRef::new(&p.group_id, &p.artifact_id));
        }
        kept
    });
    gone
}

/// Remove every profile whose id is listed in `removal.profiles`.
#[tracing::instrument(skip_all, fields(profiles = removal.profiles.len()))]
pub fn remove_profiles(reactor: &mut Reactor, removal: &RemovalConfig, report: &mut Report) -> usize {
    if removal.profiles.is_empty() {
        return 0;
    }
    let ids: BTreeSet<&str> = removal.profiles.iter().map(|s| s.trim()).collect();
    let mut removed = 0;
    for id in reactor.ids().collect::<Vec<_>>() {
        let module_ga = reactor.project_ref(id);
        let profiles = &mut reactor.module_mut(id).profiles;
        let mut gone = Vec::new();
        profiles.retain(|p| {
            let keep = !ids.contains(p.id.as_str());
            if !keep {
                gone.push(p.id.clone());
            }
            keep
        });
        for profile in gone {
            tracing::info!(module = %module_ga, %profile, "removed profile");
            report.record_change(id, &module_ga, ChangeTarget::RemovedProfile { id: profile }, None, None);
            removed += 1;
        }
    }
    removed
}

// ---------------------------------------------------------------------------
// enforce-project-version
// ---------------------------------------------------------------------------

/// In `pom`-packaged modules, replace `${project.version}` used as a
/// dependency version or a property value with the module's concrete
/// version. Profiles are included.
#[tracing::instrument(skip_all)]
pub fn enforce_project_version(reactor: &mut Reactor, report: &mut Report) -> usize {
    let mut changed = 0;
    for id in reactor.ids().collect::<Vec<_>>() {
        if !reactor.module(id).is_pom() {
            continue;
        }
        let Some(version) = reactor.version(id).filter(|v| !interpolate::has_reference(v)) else {
            tracing::debug!(module = %id, "module version is not concrete; skipping");
            continue;
        };
        let module_ga = reactor.project_ref(id);

        for decl in reactor.module(id).dependency_declarations() {
            if decl.version.as_deref() != Some(PROJECT_VERSION_REF) {
                continue;
            }
            let old = reactor
                .module_mut(id)
                .set_declared_version(&decl.path, &version)
                .flatten();
            let ga = ProjectRef::new(&decl.group_id, &decl.artifact_id);
            report.record_change(id, &module_ga, ChangeTarget::Declaration { path: decl.path, ga }, old, Some(version.clone()));
            changed += 1;
        }

        let module = reactor.module_mut(id);
        let mut bases: Vec<&mut ModelBase> = vec![&mut module.base];
        bases.extend(module.profiles.iter_mut().map(|p| &mut p.base));
        let mut renamed = Vec::new();
        for base in bases {
            for (name, value) in &mut base.properties {
                if *value == PROJECT_VERSION_REF {
                    value.clone_from(&version);
                    renamed.push(name.clone());
                }
            }
        }
        for name in renamed {
            report.record_change(
                id,
                &module_ga,
                ChangeTarget::Property { name },
                Some(PROJECT_VERSION_REF.to_owned()),
                Some(version.clone()),
            );
            changed += 1;
        }
    }
    changed
}
