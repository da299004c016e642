//! Explicit (user) overrides.
//!
//! A rule targets `group:artifact` or every artifact of a group
//! (`group:*`), optionally only inside one module. Its version is a
//! literal, empty (exclude the GA from alignment), or `bom:<name>` (take the
//! version from a named extra BOM). When several rules match a GA the most
//! specific wins: an exact artifact beats a group wildcard, and a rule
//! scoped to the module beats an unscoped one.

use std::collections::BTreeMap;

use realign_version::ProjectRef;

use super::OverrideMap;
use crate::config::ExplicitOverrideConfig;
use crate::error::AlignError;

const BOM_PREFIX: &str = "bom:";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Target {
    Artifact(ProjectRef),
    Group(String),
}

impl Target {
    fn matches(&self, ga: &ProjectRef) -> bool {
        match self {
            Self::Artifact(t) => t == ga,
            Self::Group(g) => g == ga.group_id(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum RuleVersion {
    Exclude,
    Literal(String),
    Bom { name: String, entries: OverrideMap },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Rule {
    target: Target,
    module: Option<ProjectRef>,
    version: RuleVersion,
}

impl Rule {
    /// Lower is more specific.
    const fn rank(&self) -> u8 {
        match (&self.target, &self.module) {
            (Target::Artifact(_), Some(_)) => 0,
            (Target::Artifact(_), None) => 1,
            (Target::Group(_), Some(_)) => 2,
            (Target::Group(_), None) => 3,
        }
    }

    fn applies_to_module(&self, module: &ProjectRef) -> bool {
        self.module.as_ref().is_none_or(|m| m == module)
    }
}

/// What an explicit rule says about one GA.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExplicitResolution {
    /// Never align this GA in this module.
    Exclude,
    /// Force this version.
    Version(String),
}

/// Every explicit rule of a pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExplicitOverrides {
    rules: Vec<Rule>,
}

impl ExplicitOverrides {
    /// Parse configured rules. `extra` holds the named BOMs `bom:<name>`
    /// versions refer to.
    ///
    /// # Errors
    /// Returns [`AlignError::InvalidOverride`] for a malformed target or
    /// module, a `*` group, or a reference to an unknown extra BOM.
    pub fn parse(
        configs: &[ExplicitOverrideConfig],
        extra: &BTreeMap<String, OverrideMap>,
    ) -> Result<Self, AlignError> {
        let mut rules = Vec::with_capacity(configs.len());
        for config in configs {
            rules.push(parse_rule(config, extra)?);
        }
        // Stable: equally specific rules keep configuration order.
        rules.sort_by_key(Rule::rank);
        Ok(Self { rules })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// The rules that apply inside `module`.
    #[must_use]
    pub fn for_module(&self, module: &ProjectRef) -> ModuleOverrides<'_> {
        ModuleOverrides {
            rules: self.rules.iter().filter(|r| r.applies_to_module(module)).collect(),
        }
    }
}

fn parse_rule(
    config: &ExplicitOverrideConfig,
    extra: &BTreeMap<String, OverrideMap>,
) -> Result<Rule, AlignError> {
    let target = match config.target.trim().split_once(':') {
        Some((group, "*")) if !group.is_empty() && group != "*" => Target::Group(group.to_owned()),
        Some(("*", _)) => {
            return Err(AlignError::InvalidOverride {
                value: config.target.clone(),
                reason: "the group of a target cannot be a wildcard".to_owned(),
            });
        }
        _ => Target::Artifact(
            ProjectRef::parse(&config.target).map_err(|e| AlignError::invalid_override(&config.target, &e))?,
        ),
    };

    let module = match config.module.as_deref().map(str::trim) {
        None | Some("" | "*") => None,
        Some(m) => Some(ProjectRef::parse(m).map_err(|e| AlignError::invalid_override(m, &e))?),
    };

    let raw = config.version.trim();
    let version = if raw.is_empty() {
        RuleVersion::Exclude
    } else if let Some(name) = raw.strip_prefix(BOM_PREFIX) {
        let entries = extra.get(name).cloned().ok_or_else(|| AlignError::InvalidOverride {
            value: raw.to_owned(),
            reason: format!("no extra BOM named `{name}` was supplied"),
        })?;
        RuleVersion::Bom {
            name: name.to_owned(),
            entries,
        }
    } else {
        RuleVersion::Literal(raw.to_owned())
    };

    Ok(Rule { target, module, version })
}

/// The explicit rules visible inside one module, most specific first.
#[derive(Clone, Debug, Default)]
pub struct ModuleOverrides<'a> {
    rules: Vec<&'a Rule>,
}

impl ModuleOverrides<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// What the most specific applicable rule says about `ga`.
    ///
    /// A `bom:<name>` rule whose BOM has no entry for `ga` does not apply and
    /// the next rule is consulted.
    #[must_use]
    pub fn resolve(&self, ga: &ProjectRef) -> Option<ExplicitResolution> {
        self.rules.iter().filter(|r| r.target.matches(ga)).find_map(|r| match &r.version {
            RuleVersion::Exclude => Some(ExplicitResolution::Exclude),
            RuleVersion::Literal(v) => Some(ExplicitResolution::Version(v.clone())),
            RuleVersion::Bom { name, entries } => {
                let found = entries.get(ga).map(|e| e.version().to_owned());
                if found.is_none() {
                    tracing::debug!(%ga, bom = %name, "extra BOM has no entry for explicit override");
                }
                found.map(ExplicitResolution::Version)
            }
        })
    }

    /// The forced version for `ga`, if any.
    #[must_use]
    pub fn version_for(&self, ga: &ProjectRef) -> Option<String> {
        match self.resolve(ga)? {
            ExplicitResolution::Version(v) => Some(v),
            ExplicitResolution::Exclude => None,
        }
    }

    #[must_use]
    pub fn excludes(&self, ga: &ProjectRef) -> bool {
        matches!(self.resolve(ga), Some(ExplicitResolution::Exclude))
    }

    /// Remove every entry of `overrides` excluded in this module.
    pub fn apply_exclusions(&self, overrides: &mut OverrideMap) {
        overrides.retain(|e| {
            let excluded = self.excludes(e.ga());
            if excluded {
                tracing::debug!(ga = %e.ga(), "excluded by explicit override");
            }
            !excluded
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideSource;
    use realign_version::Coordinate;

    fn rule(target: &str, module: Option<&str>, version: &str) -> ExplicitOverrideConfig {
        ExplicitOverrideConfig {
            target: target.to_owned(),
            module: module.map(str::to_owned),
            version: version.to_owned(),
        }
    }

    fn ga(s: &str) -> ProjectRef {
        ProjectRef::parse(s).unwrap()
    }

    fn extras() -> BTreeMap<String, OverrideMap> {
        let platform = OverrideMap::from_coordinates(
            &OverrideSource::Extra("platform".into()),
            [Coordinate::parse("org.p:core:7.0").unwrap()],
        );
        [("platform".to_owned(), platform)].into_iter().collect()
    }

    #[test]
    fn artifact_rule_beats_group_wildcard() {
        let rules = ExplicitOverrides::parse(
            &[rule("org.a:*", None, "1.0"), rule("org.a:special", None, "2.0")],
            &BTreeMap::new(),
        )
        .unwrap();
        let m = rules.for_module(&ga("org.app:app"));
        assert_eq!(m.version_for(&ga("org.a:special")).as_deref(), Some("2.0"));
        assert_eq!(m.version_for(&ga("org.a:other")).as_deref(), Some("1.0"));
        assert_eq!(m.version_for(&ga("org.b:other")), None);
    }

    #[test]
    fn module_scoped_rules_apply_only_there() {
        let rules = ExplicitOverrides::parse(
            &[rule("org.a:lib", Some("org.app:web"), "3.0"), rule("org.a:lib", Some("*"), "1.0")],
            &BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(rules.for_module(&ga("org.app:web")).version_for(&ga("org.a:lib")).as_deref(), Some("3.0"));
        assert_eq!(rules.for_module(&ga("org.app:core")).version_for(&ga("org.a:lib")).as_deref(), Some("1.0"));
    }

    #[test]
    fn empty_version_excludes() {
        let rules = ExplicitOverrides::parse(&[rule("org.a:*", None, "")], &BTreeMap::new()).unwrap();
        let m = rules.for_module(&ga("org.app:app"));
        assert!(m.excludes(&ga("org.a:lib")));
        assert_eq!(m.version_for(&ga("org.a:lib")), None);

        let mut overrides = OverrideMap::from_coordinates(
            &OverrideSource::Bom,
            [Coordinate::parse("org.a:lib:1.0").unwrap(), Coordinate::parse("org.b:x:1.0").unwrap()],
        );
        m.apply_exclusions(&mut overrides);
        assert_eq!(overrides.len(), 1);
    }

    #[test]
    fn bom_reference_resolves_from_extra_bom() {
        let rules = ExplicitOverrides::parse(&[rule("org.p:*", None, "bom:platform")], &extras()).unwrap();
        let m = rules.for_module(&ga("org.app:app"));
        assert_eq!(m.version_for(&ga("org.p:core")).as_deref(), Some("7.0"));
        assert_eq!(m.version_for(&ga("org.p:missing")), None);
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let none = BTreeMap::new();
        assert!(ExplicitOverrides::parse(&[rule("nocolon", None, "1")], &none).is_err());
        assert!(ExplicitOverrides::parse(&[rule("*:*", None, "1")], &none).is_err());
        assert!(ExplicitOverrides::parse(&[rule("org.a:b", Some("bad"), "1")], &none).is_err());
        let err = ExplicitOverrides::parse(&[rule("org.a:b", None, "bom:nope")], &none).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
