//! Strict alignment: a replacement must keep the original's version core.
//!
//! The candidate's trailing rebuild suffix (e.g. `.redhat-3`) is stripped
//! before comparison; with `ignore_suffix` the original's is stripped too, so
//! an already rebuilt artifact may move to a newer rebuild of the same
//! version. Versions compare as equal when they render identically or share
//! the same numeric core (trailing zeros ignored), qualifier and build
//! number: `1.2` and `1.2.0` are the same core, `1.2` and `2.0` are not.

use realign_version::VersionSpec;
use regex::Regex;

use crate::config::RealignConfig;
use crate::error::AlignError;

/// Resolved strict settings for one pass.
#[derive(Clone, Debug)]
pub struct StrictPolicy {
    pub enabled: bool,
    pub fail_on_violation: bool,
    pub ignore_suffix: bool,
    /// Matches a trailing rebuild suffix, when one is known.
    suffix: Option<Regex>,
    /// Rebuild label used for partial property rewrites.
    label: Option<String>,
}

impl Default for StrictPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl StrictPolicy {
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            fail_on_violation: false,
            ignore_suffix: false,
            suffix: None,
            label: None,
        }
    }

    /// Build the policy from configuration.
    ///
    /// # Errors
    /// Returns [`AlignError::Config`] if `alignment.strict.pattern` is not a
    /// valid regular expression.
    pub fn from_config(config: &RealignConfig) -> Result<Self, AlignError> {
        let strict = &config.alignment.strict;
        let label = config.rebuild_label();
        let suffix = match (strict.pattern.as_deref().map(str::trim), label.as_deref()) {
            (Some(pattern), _) if !pattern.is_empty() => Some(anchored(pattern)?),
            (_, Some(label)) => Some(suffix_regex(label)?),
            _ => None,
        };
        Ok(Self {
            enabled: strict.enabled,
            fail_on_violation: strict.fail_on_violation,
            ignore_suffix: strict.ignore_suffix,
            suffix,
            label,
        })
    }

    /// A policy with strict checks on and the given rebuild label.
    ///
    /// # Errors
    /// Never fails for a plain label; kept fallible to share the regex path.
    pub fn with_label(label: &str, fail_on_violation: bool) -> Result<Self, AlignError> {
        Ok(Self {
            enabled: true,
            fail_on_violation,
            ignore_suffix: false,
            suffix: Some(suffix_regex(label)?),
            label: Some(label.to_owned()),
        })
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// `version` without its trailing rebuild suffix.
    #[must_use]
    pub fn strip_suffix<'v>(&self, version: &'v str) -> &'v str {
        match self.suffix.as_ref().and_then(|re| re.find(version)) {
            Some(m) if m.start() > 0 => &version[..m.start()],
            _ => version,
        }
    }

    /// Whether `candidate` is an acceptable replacement for the resolved
    /// `original`.
    #[must_use]
    pub fn check(&self, original: &str, candidate: &str) -> bool {
        check_strict_value(original, candidate, self)
    }
}

fn suffix_regex(label: &str) -> Result<Regex, AlignError> {
    anchored(&format!(r"[.\-_]{}(?:[.\-_]\d+)?", regex::escape(label)))
}

fn anchored(pattern: &str) -> Result<Regex, AlignError> {
    Regex::new(&format!("(?:{pattern})$")).map_err(|e| {
        AlignError::Config(crate::config::ConfigError::new(format!(
            "alignment.strict: invalid rebuild suffix pattern `{pattern}`: {e}"
        )))
    })
}

/// Returns `true` if `candidate`, minus any trailing rebuild suffix, has the
/// same version core as `original`.
///
/// Empty versions never pass. Without a known rebuild suffix the whole
/// candidate must match.
#[must_use]
pub fn check_strict_value(original: &str, candidate: &str, policy: &StrictPolicy) -> bool {
    if original.trim().is_empty() || candidate.trim().is_empty() {
        return false;
    }
    let base = policy.strip_suffix(candidate);
    let original = if policy.ignore_suffix {
        policy.strip_suffix(original)
    } else {
        original
    };
    let ok = equivalent(original, base);
    tracing::trace!(original, candidate, base, ok, "strict check");
    ok
}

fn equivalent(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (a, b) = (VersionSpec::parse(a), VersionSpec::parse(b));
    !a.core().is_empty() && a.same_base(&b) && a.build_number() == b.build_number()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redhat() -> StrictPolicy {
        StrictPolicy::with_label("redhat", false).unwrap()
    }

    #[test]
    fn accepts_rebuild_of_same_core() {
        let p = redhat();
        assert!(p.check("1.2", "1.2.redhat-1"));
        assert!(p.check("1.2", "1.2.0.redhat-1"));
        assert!(p.check("1.2.GA", "1.2.GA-redhat-4"));
        assert!(p.check("1.2", "1.2"));
    }

    #[test]
    fn rejects_core_changes() {
        let p = redhat();
        assert!(!p.check("1.2", "2.0.redhat-1"));
        assert!(!p.check("1.2", "1.3.redhat-1"));
        assert!(!p.check("1.2.GA", "1.2.Final-redhat-1"));
        assert!(!p.check("", "1.2.redhat-1"));
        assert!(!p.check("1.2", ""));
    }

    #[test]
    fn ignore_suffix_allows_moving_between_rebuilds() {
        let mut p = redhat();
        assert!(!p.check("1.2.redhat-1", "1.2.redhat-2"));
        p.ignore_suffix = true;
        assert!(p.check("1.2.redhat-1", "1.2.redhat-2"));
    }

    #[test]
    fn without_suffix_the_whole_candidate_must_match() {
        let p = StrictPolicy::disabled();
        assert!(p.check("1.2", "1.2.0"));
        assert!(!p.check("1.2", "1.2.redhat-1"));
    }

    #[test]
    fn custom_pattern_from_config() {
        let mut config = RealignConfig::default();
        config.alignment.strict.enabled = true;
        config.alignment.strict.pattern = Some(r"-build\d+".to_owned());
        let p = StrictPolicy::from_config(&config).unwrap();
        assert!(p.check("3.1", "3.1-build7"));
        assert!(!p.check("3.1", "3.2-build7"));

        config.alignment.strict.pattern = Some("(".to_owned());
        assert!(StrictPolicy::from_config(&config).is_err());
    }

    #[test]
    fn label_comes_from_versioning_suffix() {
        let mut config = RealignConfig::default();
        config.versioning.incremental_suffix = Some("temporary-redhat".to_owned());
        let p = StrictPolicy::from_config(&config).unwrap();
        assert_eq!(p.label(), Some("temporary-redhat"));
        assert!(p.check("1.0", "1.0.0.temporary-redhat-00002"));
    }
}
