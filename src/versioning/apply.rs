//! Apply calculated module versions to the reactor.
//!
//! Every place that carries a re-versioned module's GAV follows the new
//! version: the module's own version, a child's declared parent, the
//! inheritance root's injected version, and intra-reactor dependencies.
//! Where the value is a `${property}` reference the property is rewritten
//! instead of the reference.
//!
//! Edits are planned against the unmodified reactor (lookups key on the old
//! interpolated GAVs) and then applied in one go.

use std::collections::BTreeMap;

use realign_version::ProjectRef;

use super::calculator::VersionChanges;
use crate::model::interpolate::{self, PropertyLocation};
use crate::model::{DeclarationPath, ModuleId, Reactor, Scope};
use crate::report::{ChangeTarget, Report, WarningKind};

#[derive(Debug)]
enum Edit {
    ModuleVersion { module: ModuleId, new: String },
    InjectVersion { module: ModuleId, new: String },
    ParentVersion { module: ModuleId, new: String },
    Declaration { module: ModuleId, path: DeclarationPath, ga: ProjectRef, new: String },
}

impl Edit {
    fn new_version(&self) -> &str {
        match self {
            Self::ModuleVersion { new, .. }
            | Self::InjectVersion { new, .. }
            | Self::ParentVersion { new, .. }
            | Self::Declaration { new, .. } => new,
        }
    }
}

#[derive(Debug, Default)]
struct Plan {
    edits: Vec<Edit>,
    properties: BTreeMap<(ModuleId, Scope, String), String>,
}

impl Plan {
    /// Queue `edit`, or a property update when the value at the edited spot
    /// (`raw`) is a `${prop}` reference.
    fn push(&mut self, reactor: &Reactor, id: ModuleId, raw: &str, edit: Edit, report: &mut Report) {
        let Some(name) = interpolate::property_reference(raw) else {
            self.edits.push(edit);
            return;
        };
        if interpolate::is_builtin(name) {
            // `${project.version}` and friends follow the module version edit.
            return;
        }
        let new = edit.new_version();
        let targets = property_targets(reactor, id, name);
        if targets.is_empty() {
            report.warn(
                WarningKind::UnresolvedProperty,
                Some(&reactor.project_ref(id)),
                format!("cannot update ${{{name}}} to {new}: property not declared in the reactor"),
            );
            return;
        }
        for loc in targets {
            self.properties
                .insert((loc.module, loc.scope, loc.name), new.to_owned());
        }
    }
}

/// Rewrite the reactor so every reference to a re-versioned module uses its
/// new version. Returns the number of edits made.
#[tracing::instrument(skip_all, fields(changes = changes.len()))]
pub fn apply_versioning_changes(
    reactor: &mut Reactor,
    changes: &VersionChanges,
    report: &mut Report,
) -> usize {
    if changes.is_empty() {
        return 0;
    }

    let mut plan = Plan::default();
    for id in reactor.order() {
        let module = reactor.module(id);

        if let Some(parent) = &module.parent {
            let resolved = interpolate::resolve(reactor, id, &parent.version);
            if let Some(new) = changes.get(&parent.project_ref().with_version(resolved)) {
                let edit = Edit::ParentVersion { module: id, new: new.clone() };
                plan.push(reactor, id, &parent.version, edit, report);
            }
        }

        let ga = reactor.project_ref(id);
        match (&module.version, reactor.version(id)) {
            (Some(raw), Some(resolved)) => {
                if let Some(new) = changes.get(&ga.with_version(resolved)) {
                    let edit = Edit::ModuleVersion { module: id, new: new.clone() };
                    plan.push(reactor, id, raw, edit, report);
                }
            }
            (None, Some(inherited)) if reactor.is_inheritance_root(id) => {
                // The version comes from an external parent; pin it here.
                if let Some(new) = changes.get(&ga.with_version(inherited)) {
                    plan.edits.push(Edit::InjectVersion { module: id, new: new.clone() });
                }
            }
            _ => {}
        }

        for decl in module.dependency_declarations() {
            let Some(raw) = decl.version.as_deref() else {
                continue;
            };
            let dep_ga = ProjectRef::new(
                interpolate::resolve(reactor, id, &decl.group_id),
                interpolate::resolve(reactor, id, &decl.artifact_id),
            );
            let resolved = interpolate::resolve(reactor, id, raw);
            if let Some(new) = changes.get(&dep_ga.with_version(resolved)) {
                let edit = Edit::Declaration {
                    module: id,
                    path: decl.path,
                    ga: dep_ga,
                    new: new.clone(),
                };
                plan.push(reactor, id, raw, edit, report);
            }
        }
    }

    let count = plan.edits.len() + plan.properties.len();
    for edit in plan.edits {
        commit(reactor, edit, report);
    }
    for ((module, scope, name), value) in plan.properties {
        let ga = reactor.project_ref(module);
        let old = reactor
            .module_mut(module)
            .set_property(scope, &name, &value)
            .flatten();
        report.record_change(module, &ga, ChangeTarget::Property { name }, old, Some(value));
    }
    count
}

/// Where a version property has to be rewritten: the nearest declaration
/// visible from `id`, or failing that every module that declares it.
fn property_targets(reactor: &Reactor, id: ModuleId, name: &str) -> Vec<PropertyLocation> {
    if let Some(loc) = interpolate::locate_property(reactor, id, name) {
        return vec![loc];
    }
    reactor
        .ids()
        .filter_map(|m| {
            reactor.module(m).own_property(name).map(|(scope, value)| PropertyLocation {
                module: m,
                scope,
                name: name.to_owned(),
                value: value.to_owned(),
            })
        })
        .collect()
}

fn commit(reactor: &mut Reactor, edit: Edit, report: &mut Report) {
    match edit {
        Edit::ModuleVersion { module, new } | Edit::InjectVersion { module, new } => {
            let ga = reactor.project_ref(module);
            let old = reactor.module_mut(module).version.replace(new.clone());
            report.record_change(module, &ga, ChangeTarget::ModuleVersion, old, Some(new));
        }
        Edit::ParentVersion { module, new } => {
            let ga = reactor.project_ref(module);
            let old = reactor
                .module_mut(module)
                .parent
                .as_mut()
                .map(|p| std::mem::replace(&mut p.version, new.clone()));
            report.record_change(module, &ga, ChangeTarget::ParentVersion, old, Some(new));
        }
        Edit::Declaration { module, path, ga, new } => {
            let module_ga = reactor.project_ref(module);
            let old = reactor
                .module_mut(module)
                .set_declared_version(&path, &new)
                .flatten();
            report.record_change(module, &module_ga, ChangeTarget::Declaration { path, ga }, old, Some(new));
        }
    }
}
