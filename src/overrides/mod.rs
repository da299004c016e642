//! Override maps: where a GA should be moved to.
//!
//! - [`OverrideEntry`] / [`OverrideMap`] : one source's `GA → version`
//!   entries, in the order the source listed them.
//! - [`resolver`] : merging BOM and REST sources by precedence.
//! - [`explicit`] : user rules, scoped per module.

pub mod explicit;
pub mod resolver;

pub use explicit::{ExplicitOverrides, ExplicitResolution, ModuleOverrides};
pub use resolver::{OverrideSources, merge, remove_reactor_entries};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use realign_version::{Coordinate, ProjectRef};
use serde::{Deserialize, Serialize};

use crate::error::AlignError;

// ---------------------------------------------------------------------------
// OverrideSource
// ---------------------------------------------------------------------------

/// Where an override came from.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub enum OverrideSource {
    Bom,
    Rest,
    /// A named extra BOM.
    Extra(String),
    Explicit,
}

impl fmt::Display for OverrideSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bom => write!(f, "bom"),
            Self::Rest => write!(f, "rest"),
            Self::Extra(name) => write!(f, "extra:{name}"),
            Self::Explicit => write!(f, "explicit"),
        }
    }
}

impl From<OverrideSource> for String {
    fn from(source: OverrideSource) -> Self {
        source.to_string()
    }
}

// ---------------------------------------------------------------------------
// OverrideEntry / OverrideMap
// ---------------------------------------------------------------------------

/// One override: the target coordinate (its version is the version to move
/// to) and the source that supplied it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OverrideEntry {
    pub target: Coordinate,
    pub source: OverrideSource,
}

impl OverrideEntry {
    #[must_use]
    pub const fn ga(&self) -> &ProjectRef {
        self.target.project_ref()
    }

    #[must_use]
    pub fn version(&self) -> &str {
        self.target.version()
    }
}

/// Ordered override entries. A GA may appear more than once (different
/// versions, types or classifiers); lookups return entries in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OverrideMap {
    entries: Vec<OverrideEntry>,
}

/// Wire form of one source: either `{"group:artifact": "version"}` or a
/// list of `group:artifact[:type[:classifier]]:version` strings.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum OverrideSnapshot {
    Pairs(BTreeMap<String, String>),
    Coordinates(Vec<String>),
}

impl OverrideMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map of `source` entries from coordinates.
    pub fn from_coordinates(
        source: &OverrideSource,
        coordinates: impl IntoIterator<Item = Coordinate>,
    ) -> Self {
        let mut map = Self::new();
        for target in coordinates {
            map.insert(OverrideEntry {
                target,
                source: source.clone(),
            });
        }
        map
    }

    /// Convert a deserialized snapshot.
    ///
    /// # Errors
    /// Returns [`AlignError::InvalidOverride`] for a malformed key or
    /// coordinate.
    pub fn from_snapshot(source: &OverrideSource, snapshot: OverrideSnapshot) -> Result<Self, AlignError> {
        let coordinates = match snapshot {
            OverrideSnapshot::Pairs(pairs) => pairs
                .into_iter()
                .map(|(ga, version)| {
                    ProjectRef::parse(&ga)
                        .map(|ga| ga.with_version(version))
                        .map_err(|e| AlignError::invalid_override(&ga, &e))
                })
                .collect::<Result<Vec<_>, _>>()?,
            OverrideSnapshot::Coordinates(list) => list
                .iter()
                .map(|s| Coordinate::parse(s).map_err(|e| AlignError::invalid_override(s, &e)))
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(Self::from_coordinates(source, coordinates))
    }

    /// Append an entry. An entry identical to an existing one is dropped.
    pub fn insert(&mut self, entry: OverrideEntry) {
        if !self.entries.iter().any(|e| e.target == entry.target) {
            self.entries.push(entry);
        }
    }

    pub fn extend(&mut self, other: Self) {
        for entry in other.entries {
            self.insert(entry);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverrideEntry> {
        self.entries.iter()
    }

    /// Entries for `ga`, in source order.
    pub fn for_ga<'a>(&'a self, ga: &ProjectRef) -> impl Iterator<Item = &'a OverrideEntry> + use<'a> {
        let ga = ga.clone();
        self.entries.iter().filter(move |e| *e.ga() == ga)
    }

    /// First entry for `ga`.
    #[must_use]
    pub fn get(&self, ga: &ProjectRef) -> Option<&OverrideEntry> {
        self.entries.iter().find(|e| e.ga() == ga)
    }

    /// Every distinct GA, sorted.
    #[must_use]
    pub fn gas(&self) -> BTreeSet<ProjectRef> {
        self.entries.iter().map(|e| e.ga().clone()).collect()
    }

    pub fn retain(&mut self, keep: impl FnMut(&OverrideEntry) -> bool) {
        self.entries.retain(keep);
    }
}

impl<'a> IntoIterator for &'a OverrideMap {
    type Item = &'a OverrideEntry;
    type IntoIter = std::slice::Iter<'a, OverrideEntry>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
