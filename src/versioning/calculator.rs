//! Module version calculation.
//!
//! [`calculate`] turns one original version into its rebuilt form under a
//! [`VersionPolicy`]; [`calculate_versioning_changes`] does it for a whole
//! reactor and then reconciles build numbers so that modules released
//! together share one version.

use std::collections::{BTreeMap, BTreeSet};

use realign_version::{Coordinate, ProjectRef, VersionSpec};

use crate::model::Reactor;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Which qualifier suffix to apply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Suffix {
    #[default]
    None,
    /// Append this suffix as-is (e.g. `redhat-1`).
    Static(String),
    /// Append this label and pick the next free build number.
    Incremental(String),
}

/// A version-change policy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionPolicy {
    /// Use this literal instead of the original version.
    pub override_version: Option<String>,
    pub suffix: Suffix,
    /// Keep `-SNAPSHOT` on suffixed versions.
    pub preserve_snapshot: bool,
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Source of already-published versions for incremental build numbers.
pub trait VersionCandidates {
    /// Versions known to exist for `ga`. Order is irrelevant.
    fn versions(&self, ga: &ProjectRef) -> Vec<String>;
}

/// No published versions known.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCandidates;

impl VersionCandidates for NoCandidates {
    fn versions(&self, _ga: &ProjectRef) -> Vec<String> {
        Vec::new()
    }
}

impl VersionCandidates for BTreeMap<ProjectRef, BTreeSet<String>> {
    fn versions(&self, ga: &ProjectRef) -> Vec<String> {
        self.get(ga)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl VersionCandidates for BTreeMap<ProjectRef, Vec<String>> {
    fn versions(&self, ga: &ProjectRef) -> Vec<String> {
        self.get(ga).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Old module GAV → new version string, for modules whose version changes.
pub type VersionChanges = BTreeMap<Coordinate, String>;

/// Compute the new version of one artifact.
///
/// The incremental policy treats `original` itself as a published
/// candidate, so re-running on an already-suffixed version always moves to
/// the next build number. Build numbers never decrease.
#[must_use]
pub fn calculate(
    ga: &ProjectRef,
    original: &str,
    policy: &VersionPolicy,
    candidates: &dyn VersionCandidates,
) -> VersionSpec {
    let base = policy.override_version.as_deref().unwrap_or(original);
    let mut spec = VersionSpec::parse(base);

    match &policy.suffix {
        Suffix::None => {}
        Suffix::Static(suffix) => {
            spec.append_qualifier_suffix(suffix);
            if !policy.preserve_snapshot {
                spec.set_snapshot(false);
            }
        }
        Suffix::Incremental(suffix) => {
            let mut known = candidates.versions(ga);
            known.push(base.to_owned());
            spec.append_qualifier_suffix(suffix);
            let next = spec.find_highest_matching_build_number(&known) + 1;
            if next > spec.build_number().unwrap_or(0) {
                spec.set_build_number(next);
            }
            if !policy.preserve_snapshot {
                spec.set_snapshot(false);
            }
            tracing::debug!(%ga, original, candidates = known.len(), next, "incremental build number");
        }
    }
    spec
}

/// Compute new versions for every module in the reactor.
///
/// First every module is calculated independently. Then, if more than one
/// distinct build-numbered version came out, each module's build number is
/// raised to the highest one sharing its base, so modules built together
/// end up with the same version. Modules whose version does not change are
/// left out of the result.
#[tracing::instrument(skip_all, fields(modules = reactor.len(), osgi))]
pub fn calculate_versioning_changes(
    reactor: &Reactor,
    policy: &VersionPolicy,
    osgi: bool,
    candidates: &dyn VersionCandidates,
) -> VersionChanges {
    let mut computed: Vec<(Coordinate, VersionSpec)> = Vec::new();
    let mut rendered: BTreeSet<String> = BTreeSet::new();

    for id in reactor.ids() {
        let ga = reactor.project_ref(id);
        let Some(original) = reactor.version(id) else {
            tracing::debug!(%ga, "module has no version; skipping");
            continue;
        };
        let spec = calculate(&ga, &original, policy, candidates);
        if spec.has_build_number() {
            rendered.insert(spec.render_with(osgi));
        }
        computed.push((ga.with_version(original), spec));
    }

    let mut changes = VersionChanges::new();
    for (gav, mut spec) in computed {
        if rendered.len() > 1 {
            let highest = spec.find_highest_matching_build_number(&rendered);
            if highest > 0 {
                spec.set_build_number(highest);
            }
        }
        let new_version = spec.render_with(osgi);
        rendered.insert(new_version.clone());
        if gav.version() != new_version {
            tracing::debug!(gav = %gav, new = %new_version, "module marked for re-versioning");
            changes.insert(gav, new_version);
        }
    }
    changes
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn incremental_build_numbers_never_decrease(
            major in 0u32..20,
            minor in 0u32..20,
            existing in 0u64..50,
            known in prop::collection::vec(0u64..60, 0..6),
        ) {
            let ga = ProjectRef::new("org.p", "p");
            let original = format!("{major}.{minor}.redhat-{existing}");
            let mut map: BTreeMap<ProjectRef, Vec<String>> = BTreeMap::new();
            map.insert(
                ga.clone(),
                known.iter().map(|n| format!("{major}.{minor}.redhat-{n}")).collect(),
            );
            let policy = VersionPolicy {
                suffix: Suffix::Incremental("redhat".to_owned()),
                ..VersionPolicy::default()
            };
            let spec = calculate(&ga, &original, &policy, &map);
            let build = spec.build_number().unwrap_or(0);
            prop_assert!(build > existing);
            prop_assert!(known.iter().all(|&n| build > n));
        }
    }
}
