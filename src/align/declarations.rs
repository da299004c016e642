//! The per-declaration state machine.
//!
//! [`Evaluator::evaluate`] takes one declaration matched by one or more
//! override entries to its terminal [`Outcome`]:
//!
//! ```text
//! empty override           -> Skipped(EmptyOverride)
//! no declared version      -> Skipped(Unmanaged)
//! own project version      -> Skipped(SelfReference)
//! explicit rule for the GA -> DeferredToExplicit
//! strict check fails       -> Err(StrictViolation) | Skipped(StrictViolation)
//! `${prop}` version        -> PropertyUpdated | PropertyRejected | Err(PropertyClash)
//! otherwise                -> LiteralUpdated | Skipped(AlreadyAligned)
//! ```
//!
//! Evaluation only reads the reactor. A literal rewrite comes back as
//! [`Step::SetLiteral`] for the caller to apply; property demands go to the
//! [`PropertyEngine`].

use realign_version::ProjectRef;

use super::property::PropertyEngine;
use super::strict::StrictPolicy;
use super::{Outcome, SkipReason};
use crate::error::AlignError;
use crate::model::interpolate;
use crate::model::{Declaration, ModuleId, Reactor};
use crate::overrides::{ModuleOverrides, OverrideEntry};
use crate::report::{Report, WarningKind};

/// What the caller has to do with a declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Nothing to write; the outcome is final.
    Done(Outcome),
    /// Replace the declared version text (outcome `LiteralUpdated`).
    SetLiteral(String),
}

impl Step {
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        match self {
            Self::Done(outcome) => *outcome,
            Self::SetLiteral(_) => Outcome::LiteralUpdated,
        }
    }
}

/// A declaration being evaluated, with its context.
#[derive(Clone, Copy, Debug)]
pub struct Site<'a> {
    pub module: ModuleId,
    pub module_ga: &'a ProjectRef,
    pub declaration: &'a Declaration,
    /// The declaration's interpolated GA.
    pub ga: &'a ProjectRef,
}

impl Site<'_> {
    const fn context(&self) -> &'static str {
        if self.declaration.is_plugin() { "plugin" } else { "dependency" }
    }

    fn declared_version(&self) -> Option<&str> {
        self.declaration
            .version
            .as_deref()
            .filter(|v| !v.trim().is_empty())
    }
}

/// Policy for evaluating declarations.
#[derive(Clone, Copy, Debug)]
pub struct Evaluator<'a> {
    pub strict: &'a StrictPolicy,
    pub fail_on_property_clash: bool,
}

impl Evaluator<'_> {
    /// Evaluate the merged-override `entries` for one declaration.
    ///
    /// Among several entries for the GA the first wins; under strict
    /// alignment the first one that passes the strict check wins.
    ///
    /// # Errors
    /// [`AlignError::StrictViolation`] when no entry passes a strict check
    /// configured as fatal; [`AlignError::PropertyClash`] when the version
    /// property is already mapped elsewhere and clashes are fatal.
    pub fn evaluate(
        &self,
        reactor: &Reactor,
        engine: &mut PropertyEngine,
        report: &mut Report,
        site: Site<'_>,
        entries: &[&OverrideEntry],
        explicit: &ModuleOverrides<'_>,
    ) -> Result<Step, AlignError> {
        let versions: Vec<&str> = entries
            .iter()
            .map(|e| e.version().trim())
            .filter(|v| !v.is_empty())
            .collect();
        let Some(&first) = versions.first() else {
            report.warn(
                WarningKind::EmptyOverride,
                Some(site.module_ga),
                format!("override for {} has no version; skipping", site.ga),
            );
            return Ok(Step::Done(Outcome::Skipped(SkipReason::EmptyOverride)));
        };

        let Some(old) = site.declared_version() else {
            return Ok(Step::Done(Outcome::Skipped(SkipReason::Unmanaged)));
        };
        let resolved = interpolate::resolve(reactor, site.module, old);

        let raw_project_version = reactor.module(site.module).raw_version();
        if (interpolate::has_reference(old) && raw_project_version == Some(old))
            || interpolate::follows_project_version(reactor, site.module, old)
        {
            tracing::debug!(ga = %site.ga, version = old, "declaration follows the project version");
            return Ok(Step::Done(Outcome::Skipped(SkipReason::SelfReference)));
        }

        if explicit.version_for(site.ga).is_some() {
            return Ok(Step::Done(Outcome::DeferredToExplicit));
        }

        let target = if self.strict.enabled {
            versions.iter().copied().find(|v| self.strict.check(&resolved, v))
        } else {
            Some(first)
        };
        let Some(target) = target else {
            return self.strict_violation(report, site, &resolved, first);
        };

        if let Some(name) = interpolate::property_reference(old)
            && !interpolate::is_builtin(name)
        {
            return self.property(reactor, engine, report, site, name, target, false);
        }
        Ok(self.literal(old, target))
    }

    /// Apply an explicit rule's `version` to one declaration. Explicit
    /// versions are never strict-checked.
    ///
    /// # Errors
    /// [`AlignError::PropertyClash`] when the version property already
    /// holds a different explicit mapping and clashes are fatal.
    pub fn evaluate_explicit(
        &self,
        reactor: &Reactor,
        engine: &mut PropertyEngine,
        report: &mut Report,
        site: Site<'_>,
        version: &str,
    ) -> Result<Step, AlignError> {
        let version = version.trim();
        if version.is_empty() {
            return Ok(Step::Done(Outcome::Skipped(SkipReason::EmptyOverride)));
        }
        let Some(old) = site.declared_version() else {
            return Ok(Step::Done(Outcome::Skipped(SkipReason::Unmanaged)));
        };
        if let Some(name) = interpolate::property_reference(old)
            && !interpolate::is_builtin(name)
        {
            return self.property(reactor, engine, report, site, name, version, true);
        }
        Ok(self.literal(old, version))
    }

    fn strict_violation(
        &self,
        report: &mut Report,
        site: Site<'_>,
        original: &str,
        candidate: &str,
    ) -> Result<Step, AlignError> {
        if self.strict.fail_on_violation {
            return Err(AlignError::StrictViolation {
                module: site.module_ga.clone(),
                ga: site.ga.clone(),
                context: site.context(),
                original: original.to_owned(),
                candidate: candidate.to_owned(),
            });
        }
        report.warn(
            WarningKind::StrictViolation,
            Some(site.module_ga),
            format!(
                "replacing {original} with {candidate} for {} {} violates the strict version-alignment rule; skipped",
                site.context(),
                site.ga
            ),
        );
        Ok(Step::Done(Outcome::Skipped(SkipReason::StrictViolation)))
    }

    #[allow(clippy::too_many_arguments)]
    fn property(
        &self,
        reactor: &Reactor,
        engine: &mut PropertyEngine,
        report: &mut Report,
        site: Site<'_>,
        name: &str,
        target: &str,
        explicit: bool,
    ) -> Result<Step, AlignError> {
        let outcome = engine.record_or_validate(reactor, site.module, name, target, site.ga, explicit);
        if outcome.is_accepted() {
            return Ok(Step::Done(Outcome::PropertyUpdated));
        }
        let (existing, existing_explicit) = engine
            .mapping_for(reactor, site.module, name)
            .map(|m| (m.new.clone(), m.explicit))
            .unwrap_or_default();
        if existing_explicit && !explicit {
            tracing::debug!(property = name, %existing, rejected = target, ga = %site.ga, "explicit mapping wins");
            return Ok(Step::Done(Outcome::PropertyRejected));
        }
        if self.fail_on_property_clash {
            return Err(AlignError::PropertyClash {
                module: site.module_ga.clone(),
                property: name.to_owned(),
                existing,
                rejected: target.to_owned(),
                ga: site.ga.clone(),
            });
        }
        report.warn(
            WarningKind::PropertyClash,
            Some(site.module_ga),
            format!(
                "${{{name}}} is already mapped to {existing}; rejecting {target} demanded by {}",
                site.ga
            ),
        );
        Ok(Step::Done(Outcome::PropertyRejected))
    }

    /// Literal rewrite of `old` to `target`.
    ///
    /// A mixed value (literal text around a property reference) that already
    /// carries the rebuild label keeps everything before the label and
    /// takes only the label onwards from `target`:
    /// `${base}.1-redhat-1` + `2.0.1.redhat-2` gives `${base}.1-redhat-2`.
    /// Otherwise the whole value is replaced.
    fn literal(&self, old: &str, target: &str) -> Step {
        let new = match self.strict.label() {
            Some(label) if interpolate::has_reference(old) => splice(old, target, label),
            _ => None,
        }
        .unwrap_or_else(|| target.to_owned());
        if new == old {
            Step::Done(Outcome::Skipped(SkipReason::AlreadyAligned))
        } else {
            Step::SetLiteral(new)
        }
    }
}

fn splice(old: &str, target: &str, label: &str) -> Option<String> {
    let (head, _) = old.split_once(label)?;
    let (_, tail) = target.split_once(label)?;
    Some(format!("{head}{label}{tail}"))
}
