//! Fatal alignment errors.
//!
//! Defines [`AlignError`], the only error an alignment pass can end with.
//! Every per-declaration problem that is not configured as fatal is recorded
//! as a warning in the [`Report`](crate::report::Report) instead; reaching
//! this type means the pass was aborted and nothing was committed.
//!
//! Messages are written for whoever reads the build log: what happened, the
//! exact coordinate and versions involved, and a `To fix:` line.

use realign_version::{IdentError, ProjectRef};
use thiserror::Error;

use crate::config::ConfigError;

/// Why a pass was aborted.
#[derive(Debug, Error)]
pub enum AlignError {
    /// A candidate version changed the core of the original version while
    /// strict alignment was configured to fail on violations.
    #[error(
        "{context} {ga} in module {module}: replacing {original} with {candidate} violates the strict version-alignment rule.\n  To fix: add an explicit override for {ga}, or set alignment.strict.fail_on_violation = false to skip it with a warning"
    )]
    StrictViolation {
        /// Module whose declaration was being aligned.
        module: ProjectRef,
        /// The GA being aligned.
        ga: ProjectRef,
        /// What kind of reference was checked (`dependency`, `parent`, ...).
        context: &'static str,
        /// The original (resolved) version.
        original: String,
        /// The rejected candidate version.
        candidate: String,
    },

    /// Two automatic overrides demanded different values for the same
    /// version property and property clashes are configured as fatal.
    #[error(
        "property ${{{property}}} in module {module} would be set to both {existing} and {rejected} (the latter demanded by {ga}).\n  To fix: add an explicit override for {ga}, give the dependencies separate version properties, or set alignment.fail_on_property_clash = false"
    )]
    PropertyClash {
        /// Module that declares the property.
        module: ProjectRef,
        /// Property name, without `${}`.
        property: String,
        /// Value already recorded for the property.
        existing: String,
        /// Value that conflicted with it.
        rejected: String,
        /// GA whose override was rejected.
        ga: ProjectRef,
    },

    /// A declaration references a rewritten property without itself having
    /// been aligned to that version.
    #[error(
        "{ga} in module {module} uses ${{{property}}}, which was updated to {new_version} for other dependencies, but {ga} was not aligned to that version.\n  To fix: give {ga} its own version property, or lower alignment.property_validation to \"warn\""
    )]
    PropertyValidation {
        /// Module holding the declaration.
        module: ProjectRef,
        /// Property name, without `${}`.
        property: String,
        /// The declaration's GA.
        ga: ProjectRef,
        /// The value the property was updated to.
        new_version: String,
    },

    /// An explicit override rule could not be interpreted.
    #[error("invalid override `{value}`: {reason}.\n  To fix: use `group:artifact` or `group:*` targets and a version, `\"\"`, or `bom:<name>`")]
    InvalidOverride {
        /// The offending text.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The reactor handed to the pass is not a valid module tree.
    #[error("invalid reactor: {reason}.\n  To fix: check the reactor snapshot's parent indices and module list")]
    InvalidReactor {
        /// What is wrong with it.
        reason: String,
    },

    /// Configuration could not be used.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AlignError {
    /// Convenience constructor for [`AlignError::InvalidOverride`] from a
    /// coordinate parse failure.
    pub(crate) fn invalid_override(value: &str, err: &IdentError) -> Self {
        Self::InvalidOverride {
            value: value.to_owned(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_violation_names_everything_needed_to_fix_it() {
        let err = AlignError::StrictViolation {
            module: ProjectRef::new("org.app", "web"),
            ga: ProjectRef::new("org.a", "lib"),
            context: "dependency",
            original: "1.2".to_owned(),
            candidate: "2.0.redhat-1".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("org.a:lib"));
        assert!(msg.contains("org.app:web"));
        assert!(msg.contains("1.2"));
        assert!(msg.contains("2.0.redhat-1"));
        assert!(msg.contains("To fix:"));
    }

    #[test]
    fn property_clash_renders_property_reference() {
        let err = AlignError::PropertyClash {
            module: ProjectRef::new("org.app", "parent"),
            property: "foo.version".to_owned(),
            existing: "1.0.redhat-1".to_owned(),
            rejected: "1.0.redhat-2".to_owned(),
            ga: ProjectRef::new("org.y", "y"),
        };
        assert!(err.to_string().contains("${foo.version}"));
    }
}
