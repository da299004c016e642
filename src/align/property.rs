//! Shared version properties.
//!
//! Many declarations can take their version from one `${prop}`. The engine
//! caches one mapping per property (keyed by the module that declares it,
//! or the inheritance root when nothing declares it) and decides what a
//! second, different demand means. Nothing is written until [`flush`], so
//! every declaration in the pass sees the original values.
//!
//! [`flush`]: PropertyEngine::flush

use std::collections::{BTreeMap, BTreeSet};

use realign_version::ProjectRef;

use crate::config::ValidationLevel;
use crate::error::AlignError;
use crate::model::interpolate;
use crate::model::{ModuleId, Reactor, Scope};
use crate::report::{ChangeTarget, Report, WarningKind};

/// Result of [`PropertyEngine::record_or_validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyOutcome {
    /// First mapping for the property.
    AcceptedNew,
    /// Same value as the cached mapping.
    AcceptedIdentical,
    /// A different value is already cached and wins.
    RejectedConflict,
    /// An explicit demand replaced a cached automatic one.
    OverriddenByExplicit,
}

impl PropertyOutcome {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        !matches!(self, Self::RejectedConflict)
    }
}

/// One pending property update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyMapping {
    /// Module the property is written to.
    pub module: ModuleId,
    /// Declaring scope, or `None` when the property is declared nowhere and
    /// will be injected into the module's main properties.
    pub scope: Option<Scope>,
    pub name: String,
    /// Resolved value before the pass.
    pub old: String,
    pub new: String,
    /// GA whose override created the mapping.
    pub origin: ProjectRef,
    pub explicit: bool,
    /// Every GA that asked for exactly `new`.
    pub demanded_by: BTreeSet<ProjectRef>,
}

/// Pass-scoped cache of property mappings.
#[derive(Clone, Debug, Default)]
pub struct PropertyEngine {
    mappings: BTreeMap<(ModuleId, String), PropertyMapping>,
}

/// Where property `name`, as seen from `module`, lives.
fn locate(reactor: &Reactor, module: ModuleId, name: &str) -> (ModuleId, Option<Scope>, String) {
    match interpolate::locate_property(reactor, module, name) {
        Some(loc) => (loc.module, Some(loc.scope), loc.name),
        None => (reactor.inheritance_root(module), None, name.to_owned()),
    }
}

impl PropertyEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn mappings(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.mappings.values()
    }

    /// The mapping property `name` would use when referenced from `module`.
    #[must_use]
    pub fn mapping_for(&self, reactor: &Reactor, module: ModuleId, name: &str) -> Option<&PropertyMapping> {
        let (owner, _, name) = locate(reactor, module, name);
        self.mappings.get(&(owner, name))
    }

    /// Record that `origin`, declared in `module` with version `${name}`,
    /// wants the property set to `new`.
    ///
    /// Explicit demands beat automatic ones. Between two automatic demands
    /// the first one wins; between two explicit demands likewise.
    pub fn record_or_validate(
        &mut self,
        reactor: &Reactor,
        module: ModuleId,
        name: &str,
        new: &str,
        origin: &ProjectRef,
        explicit: bool,
    ) -> PropertyOutcome {
        let (owner, scope, resolved_name) = locate(reactor, module, name);
        let key = (owner, resolved_name.clone());

        let Some(existing) = self.mappings.get_mut(&key) else {
            let old = interpolate::resolve(reactor, module, &format!("${{{name}}}"));
            tracing::debug!(property = %resolved_name, %old, %new, %origin, explicit, "caching property mapping");
            self.mappings.insert(
                key,
                PropertyMapping {
                    module: owner,
                    scope,
                    name: resolved_name,
                    old,
                    new: new.to_owned(),
                    origin: origin.clone(),
                    explicit,
                    demanded_by: BTreeSet::from([origin.clone()]),
                },
            );
            return PropertyOutcome::AcceptedNew;
        };

        if existing.new == new {
            existing.demanded_by.insert(origin.clone());
            return PropertyOutcome::AcceptedIdentical;
        }
        if explicit && !existing.explicit {
            tracing::debug!(
                property = %existing.name,
                replaced = %existing.new,
                %new,
                %origin,
                "explicit override replaces property mapping"
            );
            existing.new = new.to_owned();
            existing.origin = origin.clone();
            existing.explicit = true;
            existing.demanded_by = BTreeSet::from([origin.clone()]);
            return PropertyOutcome::OverriddenByExplicit;
        }
        PropertyOutcome::RejectedConflict
    }

    /// Check every pure `${prop}` declaration whose property received a
    /// mapping: its GA must have asked for that same value. Returns the
    /// number of mismatches.
    ///
    /// # Errors
    /// Returns [`AlignError::PropertyValidation`] on the first mismatch when
    /// `level` is [`ValidationLevel::Fail`].
    pub fn validate(&self, reactor: &Reactor, level: ValidationLevel, report: &mut Report) -> Result<usize, AlignError> {
        if level == ValidationLevel::Off || self.mappings.is_empty() {
            return Ok(0);
        }
        let mut mismatches = 0;
        for id in reactor.order() {
            let module_ga = reactor.project_ref(id);
            for decl in reactor.module(id).declarations() {
                let Some(name) = decl.version.as_deref().and_then(interpolate::property_reference) else {
                    continue;
                };
                if interpolate::is_builtin(name) {
                    continue;
                }
                let Some(mapping) = self.mapping_for(reactor, id, name) else {
                    continue;
                };
                let ga = ProjectRef::new(
                    interpolate::resolve(reactor, id, &decl.group_id),
                    interpolate::resolve(reactor, id, &decl.artifact_id),
                );
                if mapping.demanded_by.contains(&ga) {
                    continue;
                }
                mismatches += 1;
                if level == ValidationLevel::Fail {
                    return Err(AlignError::PropertyValidation {
                        module: module_ga,
                        property: name.to_owned(),
                        ga,
                        new_version: mapping.new.clone(),
                    });
                }
                report.warn(
                    WarningKind::PropertyValidation,
                    Some(&module_ga),
                    format!(
                        "{ga} uses ${{{name}}}, updated to {} for {}, but was not aligned to that version",
                        mapping.new, mapping.origin
                    ),
                );
            }
        }
        Ok(mismatches)
    }

    /// Write every mapping into the reactor. Properties declared nowhere
    /// are injected into the main properties of the owning inheritance
    /// root. Returns the number of properties changed.
    pub fn flush(self, reactor: &mut Reactor, report: &mut Report) -> usize {
        let mut changed = 0;
        for mapping in self.mappings.into_values() {
            let module_ga = reactor.project_ref(mapping.module);
            let scope = match mapping.scope {
                Some(scope) => scope,
                None => {
                    report.warn(
                        WarningKind::UnresolvedProperty,
                        Some(&module_ga),
                        format!(
                            "property ${{{}}} is not declared in the inheritance chain; injecting {} at the inheritance root",
                            mapping.name, mapping.new
                        ),
                    );
                    Scope::Main
                }
            };
            let Some(previous) = reactor
                .module_mut(mapping.module)
                .set_property(scope, &mapping.name, &mapping.new)
            else {
                continue;
            };
            if previous.as_deref() != Some(mapping.new.as_str()) {
                changed += 1;
                report.record_change(
                    mapping.module,
                    &module_ga,
                    ChangeTarget::Property { name: mapping.name },
                    previous,
                    Some(mapping.new),
                );
            }
        }
        changed
    }
}
