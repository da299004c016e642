//! The dependency alignment stage.
//!
//! Visits modules inheritance roots first. In each module the merged
//! overrides (minus the module's explicit exclusions) are matched by GA
//! against every version-bearing declaration, then explicit rules run over
//! the same declarations. Property demands accumulate across the whole pass
//! and are validated and written once at the end.

use std::collections::BTreeSet;

use realign_version::ProjectRef;

use super::declarations::{Evaluator, Site, Step};
use super::property::PropertyEngine;
use super::strict::StrictPolicy;
use crate::config::AlignmentConfig;
use crate::error::AlignError;
use crate::model::interpolate;
use crate::model::{Declaration, Dependency, ModuleId, Reactor, Scope, Section};
use crate::overrides::{
    ExplicitOverrides, ModuleOverrides, OverrideMap, OverrideSources, merge, remove_reactor_entries,
};
use crate::report::{ChangeTarget, Report, WarningKind};

/// Inputs of the dependency stage.
#[derive(Clone, Copy, Debug)]
pub struct DependencyStage<'a> {
    pub config: &'a AlignmentConfig,
    pub strict: &'a StrictPolicy,
    pub sources: &'a OverrideSources,
    pub explicit: &'a ExplicitOverrides,
}

/// Align every declaration in the reactor. Returns the number of
/// declarations, parents, injected entries and properties changed.
///
/// # Errors
/// Returns the first fatal [`AlignError`]: a strict violation or property
/// clash configured as fatal, or a failed property validation.
#[tracing::instrument(skip_all, fields(modules = reactor.len(), precedence = %stage.config.precedence))]
pub fn run(reactor: &mut Reactor, stage: &DependencyStage<'_>, report: &mut Report) -> Result<usize, AlignError> {
    let mut merged = merge(stage.sources, stage.config.precedence, report);
    let removed = remove_reactor_entries(&mut merged, &reactor.project_refs());
    if merged.is_empty() && stage.explicit.is_empty() {
        tracing::info!("no dependency overrides to apply");
        return Ok(0);
    }
    tracing::info!(overrides = merged.len(), removed, explicit = stage.explicit.len(), "aligning dependencies");

    let inject_transitive = stage.config.override_transitive && !stage.sources.bom.is_empty();
    if stage.config.override_transitive && !inject_transitive {
        report.warn(
            WarningKind::IgnoredOption,
            None,
            "ignoring alignment.override_transitive: no BOM overrides were supplied",
        );
    }

    let evaluator = Evaluator {
        strict: stage.strict,
        fail_on_property_clash: stage.config.fail_on_property_clash,
    };
    let mut engine = PropertyEngine::new();
    let mut changed = 0;

    for id in reactor.order() {
        let module_ga = reactor.project_ref(id);
        let rules = stage.explicit.for_module(&module_ga);
        let mut overrides = merged.clone();
        rules.apply_exclusions(&mut overrides);

        if reactor.is_inheritance_root(id) {
            changed += align_parent(reactor, id, &module_ga, &overrides, &rules, stage.strict, report)?;
        }

        let mut managed: BTreeSet<ProjectRef> = BTreeSet::new();
        for decl in reactor.module(id).declarations() {
            let ga = declaration_ga(reactor, id, &decl);
            if decl.path.scope == Scope::Main && decl.path.section == Section::ManagedDependencies {
                managed.insert(ga.clone());
            }
            let entries: Vec<_> = overrides.for_ga(&ga).collect();
            let forced = rules.version_for(&ga);
            if entries.is_empty() && forced.is_none() {
                continue;
            }
            let site = Site {
                module: id,
                module_ga: &module_ga,
                declaration: &decl,
                ga: &ga,
            };
            if !entries.is_empty() {
                let step = evaluator.evaluate(reactor, &mut engine, report, site, &entries, &rules)?;
                changed += apply_step(reactor, site, step, report);
            }
            if let Some(version) = forced {
                let step = evaluator.evaluate_explicit(reactor, &mut engine, report, site, &version)?;
                changed += apply_step(reactor, site, step, report);
            }
        }

        if inject_transitive && reactor.is_inheritance_root(id) {
            changed += inject_unmatched(reactor, id, &module_ga, &overrides, &managed, report);
        }
    }

    engine.validate(reactor, stage.config.property_validation, report)?;
    changed += engine.flush(reactor, report);
    Ok(changed)
}

fn declaration_ga(reactor: &Reactor, id: ModuleId, decl: &Declaration) -> ProjectRef {
    ProjectRef::new(
        interpolate::resolve(reactor, id, &decl.group_id),
        interpolate::resolve(reactor, id, &decl.artifact_id),
    )
}

fn apply_step(reactor: &mut Reactor, site: Site<'_>, step: Step, report: &mut Report) -> usize {
    report.record_outcome(step.outcome());
    let Step::SetLiteral(version) = step else {
        return 0;
    };
    let path = site.declaration.path;
    let old = reactor
        .module_mut(site.module)
        .set_declared_version(&path, &version)
        .flatten();
    report.record_change(
        site.module,
        site.module_ga,
        ChangeTarget::Declaration {
            path,
            ga: site.ga.clone(),
        },
        old,
        Some(version),
    );
    1
}

/// Align the declared parent of an inheritance root.
fn align_parent(
    reactor: &mut Reactor,
    id: ModuleId,
    module_ga: &ProjectRef,
    overrides: &OverrideMap,
    rules: &ModuleOverrides<'_>,
    strict: &StrictPolicy,
    report: &mut Report,
) -> Result<usize, AlignError> {
    let Some(parent) = reactor.module(id).parent.clone() else {
        return Ok(0);
    };
    let parent_ga = parent.project_ref();
    let original = interpolate::resolve(reactor, id, &parent.version);

    let mut target = None;
    let candidates: Vec<&str> = overrides
        .for_ga(&parent_ga)
        .map(|e| e.version().trim())
        .filter(|v| !v.is_empty())
        .collect();
    if let Some(&first) = candidates.first() {
        if strict.enabled {
            target = candidates.iter().copied().find(|v| strict.check(&original, v));
            if target.is_none() {
                if strict.fail_on_violation {
                    return Err(AlignError::StrictViolation {
                        module: module_ga.clone(),
                        ga: parent_ga,
                        context: "parent",
                        original,
                        candidate: first.to_owned(),
                    });
                }
                report.warn(
                    WarningKind::StrictViolation,
                    Some(module_ga),
                    format!(
                        "replacing {original} with {first} for parent {parent_ga} violates the strict version-alignment rule; skipped"
                    ),
                );
            }
        } else {
            target = Some(first);
        }
    }

    let forced = rules.version_for(&parent_ga);
    let Some(new) = forced.or_else(|| target.map(str::to_owned)) else {
        return Ok(0);
    };
    if new == parent.version {
        return Ok(0);
    }
    tracing::debug!(module = %module_ga, parent = %parent_ga, old = %parent.version, %new, "aligning parent");
    if let Some(decl) = reactor.module_mut(id).parent.as_mut() {
        decl.version.clone_from(&new);
    }
    report.record_change(id, module_ga, ChangeTarget::ParentVersion, Some(parent.version), Some(new));
    Ok(1)
}

/// Put every override that matched no main managed dependency of the root
/// at the front of its managed dependencies, in override order.
fn inject_unmatched(
    reactor: &mut Reactor,
    id: ModuleId,
    module_ga: &ProjectRef,
    overrides: &OverrideMap,
    managed: &BTreeSet<ProjectRef>,
    report: &mut Report,
) -> usize {
    let mut injected: Vec<Dependency> = Vec::new();
    for entry in overrides.iter().filter(|e| !managed.contains(e.ga())) {
        let version = entry.version().trim();
        if version.is_empty() {
            continue;
        }
        let target = &entry.target;
        let duplicate = injected.iter().any(|d| {
            d.group_id == target.group_id()
                && d.artifact_id == target.artifact_id()
                && d.kind == target.kind()
                && d.classifier.as_deref() == target.classifier()
        });
        if duplicate {
            continue;
        }
        let mut dep = Dependency::new(target.group_id(), target.artifact_id(), Some(version));
        target.kind().clone_into(&mut dep.kind);
        dep.classifier = target.classifier().map(str::to_owned);
        report.record_change(
            id,
            module_ga,
            ChangeTarget::InjectedManaged { ga: entry.ga().clone() },
            None,
            Some(version.to_owned()),
        );
        injected.push(dep);
    }
    let count = injected.len();
    if count > 0 {
        tracing::info!(module = %module_ga, count, "injecting transitive overrides as managed dependencies");
        let managed_deps = &mut reactor.module_mut(id).base.managed_dependencies;
        managed_deps.splice(0..0, injected);
    }
    count
}

#[cfg(test)]
mod tests {
    use realign_version::Coordinate;

    use super::*;
    use crate::align::{Outcome, SkipReason};
    use crate::config::{ExplicitOverrideConfig, Precedence};
    use crate::model::{Module, ParentDecl, Plugin};
    use crate::overrides::OverrideSource;

    fn bom(entries: &[&str]) -> OverrideMap {
        OverrideMap::from_coordinates(&OverrideSource::Bom, entries.iter().map(|s| Coordinate::parse(s).unwrap()))
    }

    fn reactor() -> Reactor {
        let mut root = Module::new("org.app", "parent", "1.0");
        root.packaging = "pom".into();
        root.parent = Some(ParentDecl {
            group_id: "org.corp".into(),
            artifact_id: "corp-parent".into(),
            version: "10".into(),
        });
        root.base.properties.insert("lib.version".into(), "1.2".into());
        root.base
            .managed_dependencies
            .push(Dependency::new("org.a", "lib", Some("${lib.version}")));
        root.base.plugins.push(Plugin::new("org.p", "build-plugin", Some("3.0")));

        let mut web = Module::new("org.app", "web", "1.0");
        web.parent = Some(ParentDecl {
            group_id: "org.app".into(),
            artifact_id: "parent".into(),
            version: "1.0".into(),
        });
        web.parent_module = Some(ModuleId(0));
        web.base.dependencies.push(Dependency::new("org.b", "tool", Some("2.0")));
        web.base.dependencies.push(Dependency::new("org.app", "parent", Some("1.0")));
        Reactor::new(vec![root, web]).unwrap()
    }

    fn stage_run(
        reactor: &mut Reactor,
        config: &AlignmentConfig,
        strict: &StrictPolicy,
        sources: &OverrideSources,
    ) -> Result<Report, AlignError> {
        let explicit = ExplicitOverrides::parse(&config.overrides, &sources.extra)?;
        let stage = DependencyStage {
            config,
            strict,
            sources,
            explicit: &explicit,
        };
        let mut report = Report::new();
        run(reactor, &stage, &mut report)?;
        Ok(report)
    }

    fn sources(entries: &[&str]) -> OverrideSources {
        OverrideSources {
            bom: bom(entries),
            ..OverrideSources::default()
        }
    }

    fn config() -> AlignmentConfig {
        AlignmentConfig {
            precedence: Precedence::Bom,
            ..AlignmentConfig::default()
        }
    }

    #[test]
    fn aligns_literals_properties_plugins_and_parent() {
        let mut r = reactor();
        let s = sources(&[
            "org.a:lib:1.2.0.redhat-1",
            "org.b:tool:2.0.0.redhat-2",
            "org.p:build-plugin:3.0.0.redhat-1",
            "org.corp:corp-parent:10.0.0.redhat-1",
            "org.app:parent:9.9",
        ]);
        let report = stage_run(&mut r, &config(), &StrictPolicy::disabled(), &s).unwrap();

        let root = r.module(ModuleId(0));
        assert_eq!(root.base.properties["lib.version"], "1.2.0.redhat-1");
        assert_eq!(root.base.managed_dependencies[0].version.as_deref(), Some("${lib.version}"));
        assert_eq!(root.base.plugins[0].version.as_deref(), Some("3.0.0.redhat-1"));
        assert_eq!(root.parent.as_ref().unwrap().version, "10.0.0.redhat-1");

        let web = r.module(ModuleId(1));
        assert_eq!(web.base.dependencies[0].version.as_deref(), Some("2.0.0.redhat-2"));
        // Reactor modules are never redirected.
        assert_eq!(web.base.dependencies[1].version.as_deref(), Some("1.0"));
        assert_eq!(web.parent.as_ref().unwrap().version, "1.0");

        assert_eq!(report.outcome_count(Outcome::PropertyUpdated), 1);
        assert_eq!(report.outcome_count(Outcome::LiteralUpdated), 2);
    }

    #[test]
    fn strict_violation_on_parent_can_abort() {
        let mut r = reactor();
        let s = sources(&["org.corp:corp-parent:11.0.redhat-1"]);
        let strict = StrictPolicy::with_label("redhat", true).unwrap();
        let err = stage_run(&mut r, &config(), &strict, &s).unwrap_err();
        assert!(matches!(err, AlignError::StrictViolation { context: "parent", .. }));

        let lenient = StrictPolicy::with_label("redhat", false).unwrap();
        let mut r = reactor();
        let report = stage_run(&mut r, &config(), &lenient, &s).unwrap();
        assert_eq!(r.module(ModuleId(0)).parent.as_ref().unwrap().version, "10");
        assert!(report.has_warnings(WarningKind::StrictViolation));
    }

    #[test]
    fn explicit_rules_win_and_exclusions_hold() {
        let mut r = reactor();
        let mut cfg = config();
        cfg.overrides = vec![
            ExplicitOverrideConfig {
                target: "org.a:lib".into(),
                module: None,
                version: "1.5".into(),
            },
            ExplicitOverrideConfig {
                target: "org.b:*".into(),
                module: Some("org.app:web".into()),
                version: String::new(),
            },
        ];
        let s = sources(&["org.a:lib:1.2.0.redhat-1", "org.b:tool:2.0.0.redhat-2"]);
        let report = stage_run(&mut r, &cfg, &StrictPolicy::disabled(), &s).unwrap();

        assert_eq!(r.module(ModuleId(0)).base.properties["lib.version"], "1.5");
        assert_eq!(r.module(ModuleId(1)).base.dependencies[0].version.as_deref(), Some("2.0"));
        assert_eq!(report.outcome_count(Outcome::DeferredToExplicit), 1);
    }

    #[test]
    fn transitive_overrides_are_injected_at_the_root() {
        let mut r = reactor();
        let mut cfg = config();
        cfg.override_transitive = true;
        let s = sources(&["org.a:lib:1.2.0.redhat-1", "org.t:transitive:pom:4.0.redhat-1"]);
        let report = stage_run(&mut r, &cfg, &StrictPolicy::disabled(), &s).unwrap();

        let managed = &r.module(ModuleId(0)).base.managed_dependencies;
        assert_eq!(managed.len(), 2);
        assert_eq!(managed[0].artifact_id, "transitive");
        assert_eq!(managed[0].kind, "pom");
        assert_eq!(managed[1].artifact_id, "lib");
        assert!(
            report
                .changes()
                .iter()
                .any(|c| matches!(c.target, ChangeTarget::InjectedManaged { .. }))
        );
    }

    #[test]
    fn transitive_flag_needs_bom_entries() {
        let mut r = reactor();
        let mut cfg = config();
        cfg.override_transitive = true;
        cfg.precedence = Precedence::Rest;
        let s = OverrideSources {
            rest: OverrideMap::from_coordinates(
                &OverrideSource::Rest,
                [Coordinate::parse("org.b:tool:2.0.0.redhat-1").unwrap()],
            ),
            ..OverrideSources::default()
        };
        let report = stage_run(&mut r, &cfg, &StrictPolicy::disabled(), &s).unwrap();
        assert!(report.has_warnings(WarningKind::IgnoredOption));
        assert_eq!(r.module(ModuleId(0)).base.managed_dependencies.len(), 1);
    }

    #[test]
    fn unmanaged_declarations_are_tallied() {
        let mut r = reactor();
        r.module_mut(ModuleId(1))
            .base
            .dependencies
            .push(Dependency::new("org.a", "lib", None));
        let s = sources(&["org.a:lib:1.2.0.redhat-1"]);
        let report = stage_run(&mut r, &config(), &StrictPolicy::disabled(), &s).unwrap();
        assert_eq!(report.outcome_count(Outcome::Skipped(SkipReason::Unmanaged)), 1);
    }
}
