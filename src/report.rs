//! The changed-entity report produced by a successful pass.
//!
//! Every mutation made to the reactor is recorded as a [`Change`]; every
//! non-fatal problem as a [`Warning`] (and logged through `tracing` at the
//! same time, so library callers without a subscriber still see it in the
//! report). The per-declaration outcomes are tallied by label.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use realign_version::ProjectRef;
use serde::Serialize;

use crate::align::Outcome;
use crate::model::{DeclarationPath, ModuleId};

// ---------------------------------------------------------------------------
// Change
// ---------------------------------------------------------------------------

/// What was changed inside a module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum ChangeTarget {
    /// The module's own `<version>`.
    ModuleVersion,
    /// The declared `<parent>` version.
    ParentVersion,
    /// A dependency, managed dependency, plugin or plugin dependency.
    Declaration { path: DeclarationPath, ga: ProjectRef },
    /// A property value (updated or newly injected).
    Property { name: String },
    /// A managed dependency added by transitive override injection.
    InjectedManaged { ga: ProjectRef },
    /// A plugin removed by GA.
    RemovedPlugin { ga: ProjectRef },
    /// A profile removed by id.
    RemovedProfile { id: String },
}

impl fmt::Display for ChangeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleVersion => write!(f, "version"),
            Self::ParentVersion => write!(f, "parent version"),
            Self::Declaration { path, ga } => write!(f, "{ga} at {path}"),
            Self::Property { name } => write!(f, "property {name}"),
            Self::InjectedManaged { ga } => write!(f, "injected managed dependency {ga}"),
            Self::RemovedPlugin { ga } => write!(f, "removed plugin {ga}"),
            Self::RemovedProfile { id } => write!(f, "removed profile {id}"),
        }
    }
}

/// One mutation of the reactor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Change {
    pub module: ModuleId,
    pub module_ga: ProjectRef,
    pub target: ChangeTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.module_ga, self.target)?;
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => write!(f, ": {old} -> {new}"),
            (None, Some(new)) => write!(f, ": {new}"),
            (Some(old), None) => write!(f, ": was {old}"),
            (None, None) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Warning
// ---------------------------------------------------------------------------

/// Category of a non-fatal problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    StrictViolation,
    PropertyClash,
    PropertyValidation,
    UnresolvedProperty,
    EmptyOverride,
    NoOverrides,
    IgnoredOption,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StrictViolation => "strict-violation",
            Self::PropertyClash => "property-clash",
            Self::PropertyValidation => "property-validation",
            Self::UnresolvedProperty => "unresolved-property",
            Self::EmptyOverride => "empty-override",
            Self::NoOverrides => "no-overrides",
            Self::IgnoredOption => "ignored-option",
        };
        f.write_str(s)
    }
}

/// A non-fatal problem recorded during the pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<ProjectRef>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(m) => write!(f, "[{}] {m}: {}", self.kind, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything a successful pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    changes: Vec<Change>,
    warnings: Vec<Warning>,
    outcomes: BTreeMap<String, usize>,
}

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_change(
        &mut self,
        module: ModuleId,
        module_ga: &ProjectRef,
        target: ChangeTarget,
        old: Option<String>,
        new: Option<String>,
    ) {
        tracing::debug!(module = %module_ga, target = %target, ?old, ?new, "changed");
        self.changes.push(Change {
            module,
            module_ga: module_ga.clone(),
            target,
            old,
            new,
        });
    }

    /// Record (and log) a warning.
    pub fn warn(&mut self, kind: WarningKind, module: Option<&ProjectRef>, message: impl Into<String>) {
        let message = message.into();
        match module {
            Some(m) => tracing::warn!(kind = %kind, module = %m, "{message}"),
            None => tracing::warn!(kind = %kind, "{message}"),
        }
        self.warnings.push(Warning {
            kind,
            module: module.cloned(),
            message,
        });
    }

    pub fn record_outcome(&mut self, outcome: Outcome) {
        *self.outcomes.entry(outcome.label().to_owned()).or_default() += 1;
    }

    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Outcome label → number of declarations that ended there.
    #[must_use]
    pub const fn outcomes(&self) -> &BTreeMap<String, usize> {
        &self.outcomes
    }

    /// Count of declarations that ended in `outcome`.
    #[must_use]
    pub fn outcome_count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(outcome.label()).copied().unwrap_or(0)
    }

    /// Modules with at least one change.
    #[must_use]
    pub fn changed_modules(&self) -> BTreeSet<ModuleId> {
        self.changes.iter().map(|c| c.module).collect()
    }

    /// Changes made to one module.
    pub fn changes_for(&self, module: ModuleId) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(move |c| c.module == module)
    }

    #[must_use]
    pub fn has_warnings(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules = self.changed_modules().len();
        writeln!(
            f,
            "{} change(s) in {modules} module(s)",
            self.changes.len()
        )?;
        for change in &self.changes {
            writeln!(f, "  {change}")?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "{} warning(s)", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "  {warning}")?;
            }
        }
        Ok(())
    }
}
