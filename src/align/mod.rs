//! Dependency alignment.
//!
//! - [`strict`] : the strict-alignment check.
//! - [`property`] : shared version properties, updated once per pass.
//! - [`declarations`] : what happens to one declaration matched by an
//!   override ([`Outcome`]).
//! - [`dependencies`] : the stage driving all of the above over the reactor.

pub mod declarations;
pub mod dependencies;
pub mod property;
pub mod strict;

use std::fmt;

pub use declarations::{Evaluator, Site, Step};
pub use dependencies::{DependencyStage, run};
pub use property::{PropertyEngine, PropertyMapping, PropertyOutcome};
pub use strict::{StrictPolicy, check_strict_value};

/// Why a matched declaration was left alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// The override carries no version.
    EmptyOverride,
    /// The declaration has no version of its own (it is managed elsewhere).
    Unmanaged,
    /// The declaration points at the module's own version.
    SelfReference,
    /// The candidate failed the strict check and violations are not fatal.
    StrictViolation,
    /// The declaration already has the target version.
    AlreadyAligned,
}

/// Terminal state of evaluating one override against one declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Skipped(SkipReason),
    /// An explicit rule targets the GA; the explicit pass decides.
    DeferredToExplicit,
    /// The version property was mapped to the new version.
    PropertyUpdated,
    /// The version property already has a different mapping.
    PropertyRejected,
    /// The version text was rewritten.
    LiteralUpdated,
}

impl Outcome {
    /// Stable label, used as the report tally key.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Skipped(SkipReason::EmptyOverride) => "skipped:empty-override",
            Self::Skipped(SkipReason::Unmanaged) => "skipped:unmanaged",
            Self::Skipped(SkipReason::SelfReference) => "skipped:self-reference",
            Self::Skipped(SkipReason::StrictViolation) => "skipped:strict-violation",
            Self::Skipped(SkipReason::AlreadyAligned) => "skipped:already-aligned",
            Self::DeferredToExplicit => "deferred-to-explicit",
            Self::PropertyUpdated => "property-updated",
            Self::PropertyRejected => "property-rejected",
            Self::LiteralUpdated => "literal-updated",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
