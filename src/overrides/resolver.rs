//! Merging override sources.
//!
//! Collisions between the BOM and REST sources are settled per GA: the
//! losing source's entries for a colliding GA are removed entirely before
//! the winner's entries are added, so no stale version of that GA survives
//! in the merged map.

use std::collections::{BTreeMap, BTreeSet};

use realign_version::ProjectRef;

use super::OverrideMap;
use crate::config::Precedence;
use crate::report::{Report, WarningKind};

/// Every override source handed to one pass.
#[derive(Clone, Debug, Default)]
pub struct OverrideSources {
    pub bom: OverrideMap,
    pub rest: OverrideMap,
    /// Named extra BOMs. Only consulted through `bom:<name>` explicit rules.
    pub extra: BTreeMap<String, OverrideMap>,
}

/// Merge the BOM and REST sources according to `precedence`.
#[must_use]
pub fn merge(sources: &OverrideSources, precedence: Precedence, report: &mut Report) -> OverrideMap {
    let merged = match precedence {
        Precedence::Bom => {
            if sources.bom.is_empty() {
                report.warn(WarningKind::NoOverrides, None, "BOM precedence selected but no BOM overrides were supplied");
            }
            sources.bom.clone()
        }
        Precedence::Rest => {
            if sources.rest.is_empty() {
                report.warn(WarningKind::NoOverrides, None, "REST precedence selected but the alignment service returned no overrides");
            }
            sources.rest.clone()
        }
        Precedence::RestThenBom => layer(&sources.bom, &sources.rest),
        Precedence::BomThenRest => layer(&sources.rest, &sources.bom),
    };
    tracing::debug!(
        %precedence,
        bom = sources.bom.len(),
        rest = sources.rest.len(),
        merged = merged.len(),
        "merged override sources"
    );
    merged
}

/// `lower` without any GA present in `higher`, followed by `higher`.
fn layer(lower: &OverrideMap, higher: &OverrideMap) -> OverrideMap {
    let shadowed = higher.gas();
    let mut merged = lower.clone();
    merged.retain(|e| !shadowed.contains(e.ga()));
    merged.extend(higher.clone());
    merged
}

/// Drop every override targeting a GA built by this reactor. Returns the
/// number of entries removed.
pub fn remove_reactor_entries(overrides: &mut OverrideMap, reactor_gas: &BTreeSet<ProjectRef>) -> usize {
    let before = overrides.len();
    overrides.retain(|e| {
        let keep = !reactor_gas.contains(e.ga());
        if !keep {
            tracing::debug!(ga = %e.ga(), version = e.version(), "ignoring override for a reactor module");
        }
        keep
    });
    before - overrides.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::{OverrideEntry, OverrideSource};
    use realign_version::Coordinate;

    fn source(kind: &OverrideSource, entries: &[&str]) -> OverrideMap {
        OverrideMap::from_coordinates(kind, entries.iter().map(|s| Coordinate::parse(s).unwrap()))
    }

    fn sources() -> OverrideSources {
        OverrideSources {
            bom: source(&OverrideSource::Bom, &["org.a:lib:1.0", "org.a:lib:pom:1.0", "org.b:x:1.0"]),
            rest: source(&OverrideSource::Rest, &["org.a:lib:2.0", "org.c:y:3.0"]),
            extra: BTreeMap::new(),
        }
    }

    fn versions(map: &OverrideMap, ga: &str) -> Vec<String> {
        let ga = ProjectRef::parse(ga).unwrap();
        map.for_ga(&ga).map(|e| e.version().to_owned()).collect()
    }

    #[test]
    fn rest_then_bom_removes_colliding_bom_entries() {
        let mut report = Report::new();
        let merged = merge(&sources(), Precedence::RestThenBom, &mut report);
        assert_eq!(versions(&merged, "org.a:lib"), ["2.0"]);
        assert_eq!(versions(&merged, "org.b:x"), ["1.0"]);
        assert_eq!(versions(&merged, "org.c:y"), ["3.0"]);
        assert!(merged.iter().all(|e| e.ga().artifact_id() != "lib" || e.source == OverrideSource::Rest));
    }

    #[test]
    fn bom_then_rest_keeps_every_bom_entry() {
        let mut report = Report::new();
        let merged = merge(&sources(), Precedence::BomThenRest, &mut report);
        assert_eq!(versions(&merged, "org.a:lib"), ["1.0", "1.0"]);
        assert_eq!(versions(&merged, "org.c:y"), ["3.0"]);
    }

    #[test]
    fn single_source_modes_ignore_the_other() {
        let mut report = Report::new();
        let bom = merge(&sources(), Precedence::Bom, &mut report);
        assert!(versions(&bom, "org.c:y").is_empty());
        let rest = merge(&sources(), Precedence::Rest, &mut report);
        assert!(versions(&rest, "org.b:x").is_empty());
        assert!(!report.has_warnings(WarningKind::NoOverrides));
    }

    #[test]
    fn empty_selected_source_is_reported() {
        let mut report = Report::new();
        let merged = merge(&OverrideSources::default(), Precedence::Rest, &mut report);
        assert!(merged.is_empty());
        assert!(report.has_warnings(WarningKind::NoOverrides));
    }

    #[test]
    fn reactor_entries_are_removed() {
        let mut map = source(&OverrideSource::Bom, &["org.app:core:9.0", "org.b:x:1.0"]);
        let gas: BTreeSet<ProjectRef> = [ProjectRef::new("org.app", "core")].into_iter().collect();
        assert_eq!(remove_reactor_entries(&mut map, &gas), 1);
        assert_eq!(map.iter().map(OverrideEntry::ga).cloned().collect::<Vec<_>>(), [ProjectRef::new("org.b", "x")]);
    }
}
