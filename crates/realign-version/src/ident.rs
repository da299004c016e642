//! Artifact identities.
//!
//! [`ProjectRef`] is the version-independent `group:artifact` identity (the
//! GA) used for every matching and collision decision. [`Coordinate`] adds a
//! version, packaging type and classifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentError;

/// Default artifact type when none is given.
pub const DEFAULT_TYPE: &str = "jar";

// ---------------------------------------------------------------------------
// ProjectRef
// ---------------------------------------------------------------------------

/// A `group:artifact` identity, ignoring version.
///
/// Serialized as the `"group:artifact"` string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectRef {
    group_id: String,
    artifact_id: String,
}

impl ProjectRef {
    /// Create a GA from its parts.
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    /// Parse `group:artifact`.
    ///
    /// # Errors
    /// Returns an error if the input is not exactly two non-empty parts.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        const KIND: &str = "GA";
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentError::Empty { kind: KIND });
        }
        let parts: Vec<&str> = s.split(':').collect();
        let [group, artifact] = parts.as_slice() else {
            return Err(IdentError::Shape {
                kind: KIND,
                value: s.to_owned(),
                expected: "group:artifact",
            });
        };
        require_part(KIND, s, "groupId", group)?;
        require_part(KIND, s, "artifactId", artifact)?;
        Ok(Self::new(*group, *artifact))
    }

    /// The group id.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// The artifact id.
    #[must_use]
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// Attach a version, producing a plain `jar` coordinate.
    #[must_use]
    pub fn with_version(&self, version: impl Into<String>) -> Coordinate {
        Coordinate::new(self.clone(), version)
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

impl FromStr for ProjectRef {
    type Err = IdentError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProjectRef {
    type Error = IdentError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ProjectRef> for String {
    fn from(ga: ProjectRef) -> Self {
        ga.to_string()
    }
}

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

/// A fully qualified artifact coordinate: GA, version, type and classifier.
///
/// Textual form follows the usual `group:artifact[:type[:classifier]]:version`
/// convention; the type is omitted when it is `jar` and there is no
/// classifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    ga: ProjectRef,
    version: String,
    kind: String,
    classifier: Option<String>,
}

impl Coordinate {
    /// Create a `jar` coordinate without classifier.
    pub fn new(ga: ProjectRef, version: impl Into<String>) -> Self {
        Self {
            ga,
            version: version.into(),
            kind: DEFAULT_TYPE.to_owned(),
            classifier: None,
        }
    }

    /// Replace the artifact type.
    #[must_use]
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Replace the classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Option<String>) -> Self {
        self.classifier = classifier.filter(|c| !c.is_empty());
        self
    }

    /// Parse `group:artifact[:type[:classifier]]:version`.
    ///
    /// # Errors
    /// Returns an error for fewer than three or more than five parts, or
    /// when any required part is empty.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        const KIND: &str = "coordinate";
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentError::Empty { kind: KIND });
        }
        let parts: Vec<&str> = s.split(':').collect();
        let (group, artifact, kind, classifier, version) = match parts.as_slice() {
            [g, a, v] => (*g, *a, DEFAULT_TYPE, None, *v),
            [g, a, t, v] => (*g, *a, *t, None, *v),
            [g, a, t, c, v] => (*g, *a, *t, Some(*c), *v),
            _ => {
                return Err(IdentError::Shape {
                    kind: KIND,
                    value: s.to_owned(),
                    expected: "group:artifact[:type[:classifier]]:version",
                });
            }
        };
        require_part(KIND, s, "groupId", group)?;
        require_part(KIND, s, "artifactId", artifact)?;
        require_part(KIND, s, "version", version)?;
        Ok(Self::new(ProjectRef::new(group, artifact), version)
            .with_type(if kind.is_empty() { DEFAULT_TYPE } else { kind })
            .with_classifier(classifier.map(str::to_owned)))
    }

    /// The GA part.
    #[must_use]
    pub const fn project_ref(&self) -> &ProjectRef {
        &self.ga
    }

    /// The group id.
    #[must_use]
    pub fn group_id(&self) -> &str {
        self.ga.group_id()
    }

    /// The artifact id.
    #[must_use]
    pub fn artifact_id(&self) -> &str {
        self.ga.artifact_id()
    }

    /// The version string, exactly as given.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The artifact type (`jar`, `pom`, ...).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The classifier, if any.
    #[must_use]
    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ga)?;
        match &self.classifier {
            Some(c) => write!(f, ":{}:{c}", self.kind)?,
            None if self.kind != DEFAULT_TYPE => write!(f, ":{}", self.kind)?,
            None => {}
        }
        write!(f, ":{}", self.version)
    }
}

impl FromStr for Coordinate {
    type Err = IdentError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Coordinate {
    type Error = IdentError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Coordinate> for String {
    fn from(c: Coordinate) -> Self {
        c.to_string()
    }
}

fn require_part(
    kind: &'static str,
    value: &str,
    part: &'static str,
    text: &str,
) -> Result<(), IdentError> {
    if text.trim().is_empty() {
        return Err(IdentError::EmptyPart {
            kind,
            value: value.to_owned(),
            part,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ga_parses_and_displays() {
        let ga = ProjectRef::parse("org.foo:bar").unwrap();
        assert_eq!(ga.group_id(), "org.foo");
        assert_eq!(ga.artifact_id(), "bar");
        assert_eq!(ga.to_string(), "org.foo:bar");
    }

    #[test]
    fn ga_rejects_wrong_shapes() {
        assert!(matches!(
            ProjectRef::parse(""),
            Err(IdentError::Empty { .. })
        ));
        assert!(matches!(
            ProjectRef::parse("org.foo"),
            Err(IdentError::Shape { .. })
        ));
        assert!(matches!(
            ProjectRef::parse("org.foo:bar:1.0"),
            Err(IdentError::Shape { .. })
        ));
        assert!(matches!(
            ProjectRef::parse(":bar"),
            Err(IdentError::EmptyPart { part: "groupId", .. })
        ));
    }

    #[test]
    fn coordinate_accepts_type_and_classifier() {
        let c = Coordinate::parse("org.foo:bar:test-jar:tests:1.0").unwrap();
        assert_eq!(c.kind(), "test-jar");
        assert_eq!(c.classifier(), Some("tests"));
        assert_eq!(c.version(), "1.0");
        assert_eq!(c.to_string(), "org.foo:bar:test-jar:tests:1.0");

        let plain = Coordinate::parse("org.foo:bar:1.0").unwrap();
        assert_eq!(plain.kind(), "jar");
        assert_eq!(plain.to_string(), "org.foo:bar:1.0");

        let pom = Coordinate::parse("org.foo:bar:pom:1.0").unwrap();
        assert_eq!(pom.to_string(), "org.foo:bar:pom:1.0");
    }

    #[test]
    fn coordinate_rejects_missing_version() {
        assert!(matches!(
            Coordinate::parse("org.foo:bar:"),
            Err(IdentError::EmptyPart { part: "version", .. })
        ));
        assert!(Coordinate::parse("a:b:c:d:e:f").is_err());
    }

    #[test]
    fn ga_serializes_as_string() {
        let ga = ProjectRef::new("org.foo", "bar");
        let json = serde_json::to_string(&ga).unwrap();
        assert_eq!(json, "\"org.foo:bar\"");
        let back: ProjectRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ga);
        assert!(serde_json::from_str::<ProjectRef>("\"nope\"").is_err());
    }
}
