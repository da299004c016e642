//! Error types for coordinate parsing.
//!
//! Version strings never fail to parse (see [`VersionSpec::parse`]); only
//! the textual `group:artifact[:...]` identities can be rejected.
//!
//! [`VersionSpec::parse`]: crate::VersionSpec::parse

use thiserror::Error;

/// Errors returned when a coordinate string cannot be interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IdentError {
    /// The input was empty or only whitespace.
    #[error("empty {kind} string")]
    Empty {
        /// What was being parsed (`"GA"`, `"coordinate"`).
        kind: &'static str,
    },

    /// The input had the wrong number of `:`-separated parts.
    #[error("invalid {kind} `{value}`: expected {expected}")]
    Shape {
        /// What was being parsed.
        kind: &'static str,
        /// The raw input.
        value: String,
        /// Human-readable description of the accepted shapes.
        expected: &'static str,
    },

    /// One of the parts was empty (e.g. `org.foo::1.0`).
    #[error("invalid {kind} `{value}`: {part} must not be empty")]
    EmptyPart {
        /// What was being parsed.
        kind: &'static str,
        /// The raw input.
        value: String,
        /// The name of the empty part (`"groupId"`, `"artifactId"`, ...).
        part: &'static str,
    },
}
