//! Structured version strings.
//!
//! [`VersionSpec`] splits a raw version into a numeric core, a qualifier, an
//! optional trailing build number and a snapshot marker:
//!
//! ```text
//! 1.2.GA-foo-3-SNAPSHOT
//! ^^^ ^^^^^^ ^ ^^^^^^^^^
//! core  |    |  snapshot token
//!   qualifier build number
//! ```
//!
//! Parsing never fails. Strings that do not look like versions at all become
//! a single opaque qualifier with no core and no build number. Rendering an
//! unmodified `VersionSpec` reproduces its input byte for byte; every mutation
//! re-derives separators with one rule: `.` after a purely numeric segment,
//! `-` otherwise.

use std::fmt;

/// The snapshot marker, without its separator.
pub const SNAPSHOT: &str = "SNAPSHOT";

const SNAPSHOT_TOKEN: &str = "-SNAPSHOT";

/// Characters a typical version may contain. Anything else makes the string
/// opaque (ranges, whitespace, commas...).
fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+' | '~' | '$' | '{' | '}')
}

const fn is_separator(c: char) -> bool {
    matches!(c, '.' | '-' | '_')
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// BuildNumber
// ---------------------------------------------------------------------------

/// Trailing build number. Keeps the separator and zero-padding width it was
/// written with so that unmodified specs round-trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BuildNumber {
    sep: char,
    value: u64,
    width: usize,
}

impl BuildNumber {
    fn parse(sep: char, digits: &str) -> Option<Self> {
        Some(Self {
            sep,
            value: digits.parse().ok()?,
            width: digits.len(),
        })
    }

    fn render_digits(&self) -> String {
        format!("{:0width$}", self.value, width = self.width)
    }
}

// ---------------------------------------------------------------------------
// VersionSpec
// ---------------------------------------------------------------------------

/// A parsed version string. See the module docs for the decomposition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VersionSpec {
    core: Vec<String>,
    qualifier_sep: Option<char>,
    qualifier: String,
    build: Option<BuildNumber>,
    snapshot: Option<String>,
}

impl VersionSpec {
    /// Parse a raw version string. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || !raw.chars().all(is_version_char) {
            tracing::trace!(version = raw, "treating version as opaque");
            return Self::opaque(raw);
        }

        let (body, snapshot) = split_snapshot(raw);
        let (core, rest) = split_core(body);
        let (rest, build) = split_build(rest);
        let (qualifier_sep, qualifier) = match rest.chars().next() {
            Some(c) if is_separator(c) => (Some(c), &rest[c.len_utf8()..]),
            _ => (None, rest),
        };

        Self {
            core,
            qualifier_sep,
            qualifier: qualifier.to_owned(),
            build,
            snapshot: snapshot.map(str::to_owned),
        }
    }

    fn opaque(raw: &str) -> Self {
        Self {
            core: Vec::new(),
            qualifier_sep: None,
            qualifier: raw.to_owned(),
            build: None,
            snapshot: None,
        }
    }

    /// The numeric core segments, as written (leading zeros preserved).
    #[must_use]
    pub fn core(&self) -> &[String] {
        &self.core
    }

    /// The qualifier without its leading separator and without the build
    /// number. This is the "label" build numbers are associated with.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// The trailing build number, if any.
    #[must_use]
    pub fn build_number(&self) -> Option<u64> {
        self.build.as_ref().map(|b| b.value)
    }

    /// Returns `true` if a trailing build number is present.
    #[must_use]
    pub const fn has_build_number(&self) -> bool {
        self.build.is_some()
    }

    /// Returns `true` if the version carries the `-SNAPSHOT` marker.
    #[must_use]
    pub const fn is_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Append `suffix` (e.g. `redhat`, `redhat-1`, `foo-bar-0`) as a
    /// qualifier label.
    ///
    /// If the current qualifier already ends with the suffix's label, that
    /// label is replaced rather than appended again, so applying the same
    /// suffix twice is a no-op. A build number carried by `suffix` replaces
    /// the current one; otherwise a matched label keeps its build number.
    pub fn append_qualifier_suffix(&mut self, suffix: &str) {
        let (label, build) = split_suffix(suffix);
        if label.is_empty() {
            if let Some(build) = build {
                self.build = Some(build);
            }
            return;
        }

        if let Some(remaining) = strip_label(&self.qualifier, label) {
            self.qualifier = remaining;
            if self.qualifier.is_empty() {
                self.qualifier_sep = None;
            }
            if build.is_some() {
                self.build = build;
            }
        } else {
            self.fold_build_into_qualifier();
            self.build = build;
        }

        let sep = self.insertion_separator();
        if self.qualifier.is_empty() {
            self.qualifier_sep = sep;
            label.clone_into(&mut self.qualifier);
        } else {
            if let Some(sep) = sep {
                self.qualifier.push(sep);
            }
            self.qualifier.push_str(label);
        }
    }

    /// Set (or introduce) the trailing build number.
    ///
    /// An existing build number keeps its separator and zero padding; a new
    /// one is attached with `-`.
    pub fn set_build_number(&mut self, value: u64) {
        match &mut self.build {
            Some(build) => build.value = value,
            None => {
                self.build = Some(BuildNumber {
                    sep: '-',
                    value,
                    width: 1,
                });
            }
        }
    }

    /// Add or remove the `-SNAPSHOT` marker. It is always rendered last.
    pub fn set_snapshot(&mut self, snapshot: bool) {
        if !snapshot {
            self.snapshot = None;
        } else if self.snapshot.is_none() {
            self.snapshot = Some(SNAPSHOT_TOKEN.to_owned());
        }
    }

    /// Render the canonical version string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.core.join(".");
        if let Some(sep) = self.qualifier_sep {
            out.push(sep);
        }
        out.push_str(&self.qualifier);
        if let Some(build) = &self.build {
            out.push(build.sep);
            out.push_str(&build.render_digits());
        }
        if let Some(token) = &self.snapshot {
            out.push_str(token);
        }
        out
    }

    /// Render in OSGi form: at most three numeric segments followed by one
    /// qualifier segment (`major.minor.micro.qualifier`).
    ///
    /// Everything after the third core segment becomes the qualifier, with
    /// any character outside `[A-Za-z0-9_-]` replaced by `_`. Missing numeric
    /// segments are padded with `0` when a qualifier is present. Versions
    /// without a numeric core cannot be expressed in OSGi form and are
    /// rendered unchanged.
    #[must_use]
    pub fn render_osgi(&self) -> String {
        if self.core.is_empty() {
            return self.render();
        }

        let kept = self.core.len().min(3);
        let prefix = self.core[..kept].join(".");
        let full = self.render();
        let tail = &full[prefix.len()..];
        let tail = tail.strip_prefix(is_separator).unwrap_or(tail);

        let qualifier: String = tail
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if qualifier.is_empty() {
            return prefix;
        }

        let mut numeric: Vec<&str> = self.core[..kept].iter().map(String::as_str).collect();
        numeric.resize(3, "0");
        format!("{}.{qualifier}", numeric.join("."))
    }

    /// Render either canonically or in OSGi form.
    #[must_use]
    pub fn render_with(&self, osgi: bool) -> String {
        if osgi {
            self.render_osgi()
        } else {
            self.render()
        }
    }

    /// Highest build number among `candidates` that share this version's
    /// base (numeric core and qualifier label), or `0` if none match.
    ///
    /// Core segments compare numerically with trailing zeros ignored
    /// (`1.2` matches `1.2.0`), labels compare case-insensitively with all
    /// separators treated alike. Snapshot markers are ignored. Candidates
    /// that do not match, carry no build number, or carry `u64::MAX` (which
    /// has no successor) are skipped, so the result plus one never
    /// overflows.
    #[must_use]
    pub fn find_highest_matching_build_number<I, S>(&self, candidates: I) -> u64
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = self.match_key();
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let spec = Self::parse(candidate.as_ref());
                if spec.match_key() == key {
                    spec.build_number().filter(|&n| n < u64::MAX)
                } else {
                    None
                }
            })
            .max()
            .unwrap_or(0)
    }

    /// Returns `true` if both versions have the same base, ignoring build
    /// number and snapshot. Same comparison as
    /// [`find_highest_matching_build_number`](Self::find_highest_matching_build_number).
    #[must_use]
    pub fn same_base(&self, other: &Self) -> bool {
        self.match_key() == other.match_key()
    }

    fn match_key(&self) -> (Vec<String>, String) {
        let mut core: Vec<String> = self
            .core
            .iter()
            .map(|s| {
                let trimmed = s.trim_start_matches('0');
                if trimmed.is_empty() { "0" } else { trimmed }.to_owned()
            })
            .collect();
        while core.len() > 1 && core.last().is_some_and(|s| s == "0") {
            core.pop();
        }
        let label = self
            .qualifier
            .chars()
            .map(|c| {
                if is_separator(c) {
                    '-'
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect();
        (core, label)
    }

    /// Separator to use before text appended after the current last segment,
    /// or `None` when nothing precedes the insertion point or the text
    /// already ends with a separator.
    fn insertion_separator(&self) -> Option<char> {
        let preceding = if self.qualifier.is_empty() {
            self.core.last()?.as_str()
        } else {
            if self.qualifier.ends_with(is_separator) {
                return None;
            }
            self.qualifier
                .rsplit(is_separator)
                .next()
                .unwrap_or(&self.qualifier)
        };
        Some(if is_numeric(preceding) { '.' } else { '-' })
    }

    fn fold_build_into_qualifier(&mut self) {
        let Some(build) = self.build.take() else {
            return;
        };
        if self.qualifier.is_empty() {
            self.qualifier_sep = Some(build.sep);
        } else {
            self.qualifier.push(build.sep);
        }
        self.qualifier.push_str(&build.render_digits());
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for VersionSpec {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

// ---------------------------------------------------------------------------
// Decomposition helpers
// ---------------------------------------------------------------------------

fn split_snapshot(raw: &str) -> (&str, Option<&str>) {
    let token_len = SNAPSHOT_TOKEN.len();
    if raw.len() >= token_len {
        let split = raw.len() - token_len;
        if raw.is_char_boundary(split) {
            let (body, token) = raw.split_at(split);
            if token.starts_with('-') && token[1..].eq_ignore_ascii_case(SNAPSHOT) {
                return (body, Some(token));
            }
        }
    }
    (raw, None)
}

/// Split the leading `digits(.digits)*` core from the rest.
fn split_core(s: &str) -> (Vec<String>, &str) {
    let bytes = s.as_bytes();
    let mut segments = Vec::new();
    let mut pos = 0;
    loop {
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == start {
            break;
        }
        segments.push(s[start..pos].to_owned());
        let continues = bytes.get(pos) == Some(&b'.')
            && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit);
        if !continues {
            break;
        }
        pos += 1;
    }
    (segments, &s[pos..])
}

/// Split a trailing `<sep><digits>` build number off `rest`.
fn split_build(rest: &str) -> (&str, Option<BuildNumber>) {
    let digits_start = rest
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map_or(rest.len(), |(i, _)| i);
    if digits_start == rest.len() || digits_start == 0 {
        return (rest, None);
    }
    let sep = rest[..digits_start].chars().next_back();
    match sep {
        Some(sep @ ('.' | '-')) => match BuildNumber::parse(sep, &rest[digits_start..]) {
            Some(build) => (&rest[..digits_start - 1], Some(build)),
            None => (rest, None),
        },
        _ => (rest, None),
    }
}

/// Split a suffix like `foo-bar-1` into its label and optional build number.
fn split_suffix(suffix: &str) -> (&str, Option<BuildNumber>) {
    let suffix = suffix.trim();
    if let Some((label, digits)) = suffix.rsplit_once('-')
        && is_numeric(digits)
        && let Some(build) = BuildNumber::parse('-', digits)
    {
        return (label, Some(build));
    }
    if is_numeric(suffix) {
        return ("", BuildNumber::parse('-', suffix));
    }
    (suffix, None)
}

/// If `qualifier` ends with `label` on a segment boundary, return what is
/// left after removing the label and its separator.
fn strip_label(qualifier: &str, label: &str) -> Option<String> {
    if qualifier == label {
        return Some(String::new());
    }
    let head = qualifier.strip_suffix(label)?;
    let remaining = head.strip_suffix(is_separator)?;
    Some(remaining.to_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn suffixed(raw: &str, suffix: &str) -> String {
        let mut spec = VersionSpec::parse(raw);
        spec.append_qualifier_suffix(suffix);
        spec.render()
    }

    #[test]
    fn decomposes_typical_version() {
        let spec = VersionSpec::parse("1.2.GA-foo-3-SNAPSHOT");
        assert_eq!(spec.core(), ["1", "2"]);
        assert_eq!(spec.qualifier(), "GA-foo");
        assert_eq!(spec.build_number(), Some(3));
        assert!(spec.is_snapshot());
        assert_eq!(spec.render(), "1.2.GA-foo-3-SNAPSHOT");
    }

    #[test]
    fn numeric_only_version_has_no_build_number() {
        let spec = VersionSpec::parse("1.2.3");
        assert_eq!(spec.core(), ["1", "2", "3"]);
        assert_eq!(spec.qualifier(), "");
        assert!(!spec.has_build_number());
    }

    #[test]
    fn digits_glued_to_a_word_are_not_a_build_number() {
        let spec = VersionSpec::parse("1.2-SP4");
        assert_eq!(spec.qualifier(), "SP4");
        assert!(!spec.has_build_number());
    }

    #[test]
    fn property_reference_keeps_its_tail() {
        let spec = VersionSpec::parse("${property}-foo-1");
        assert!(spec.core().is_empty());
        assert_eq!(spec.qualifier(), "${property}-foo");
        assert_eq!(spec.build_number(), Some(1));
    }

    #[test]
    fn ranges_are_opaque() {
        let spec = VersionSpec::parse("[1.0,2.0)");
        assert!(spec.core().is_empty());
        assert_eq!(spec.qualifier(), "[1.0,2.0)");
        assert!(!spec.has_build_number());
        assert_eq!(spec.render(), "[1.0,2.0)");
    }

    #[test]
    fn lone_snapshot_word_is_not_a_marker() {
        let spec = VersionSpec::parse("SNAPSHOT");
        assert!(!spec.is_snapshot());
        assert_eq!(spec.render(), "SNAPSHOT");
    }

    #[test]
    fn separator_rule_numeric_tail_uses_dot() {
        assert_eq!(suffixed("1.2", "foo"), "1.2.foo");
        assert_eq!(suffixed("1.2", "foo-bar"), "1.2.foo-bar");
        assert_eq!(suffixed("1.2", "foo-1"), "1.2.foo-1");
    }

    #[test]
    fn separator_rule_word_tail_uses_dash() {
        assert_eq!(suffixed("1.2.GA", "foo"), "1.2.GA-foo");
        assert_eq!(suffixed("1.2-SP4", "foo-1"), "1.2-SP4-foo-1");
        assert_eq!(suffixed("${property}", "foo"), "${property}-foo");
    }

    #[test]
    fn matching_label_is_replaced_not_compounded() {
        assert_eq!(suffixed("1.2.foo", "foo"), "1.2.foo");
        assert_eq!(suffixed("1.2.foo-1", "foo"), "1.2.foo-1");
        assert_eq!(suffixed("1.2.foo-1", "foo-2"), "1.2.foo-2");
        assert_eq!(suffixed("1.2.GA-foo-1", "foo-2"), "1.2.GA-foo-2");
    }

    #[test]
    fn unrelated_build_number_stays_in_the_qualifier() {
        assert_eq!(suffixed("1.2.GA-jdcasey-3", "foo"), "1.2.GA-jdcasey-3.foo");
        assert_eq!(suffixed("1.2.GA-jdcasey", "foo-1"), "1.2.GA-jdcasey-foo-1");
    }

    #[test]
    fn suffix_goes_before_snapshot() {
        let mut spec = VersionSpec::parse("1.2.GA-foo-1-SNAPSHOT");
        spec.append_qualifier_suffix("foo-2");
        assert_eq!(spec.render(), "1.2.GA-foo-2-SNAPSHOT");
        spec.set_snapshot(false);
        assert_eq!(spec.render(), "1.2.GA-foo-2");
        spec.set_snapshot(true);
        assert_eq!(spec.render(), "1.2.GA-foo-2-SNAPSHOT");
    }

    #[test]
    fn set_build_number_keeps_padding() {
        let mut spec = VersionSpec::parse("1.0.redhat-00007");
        spec.set_build_number(8);
        assert_eq!(spec.render(), "1.0.redhat-00008");

        let mut fresh = VersionSpec::parse("1.0.0.Final-foo");
        fresh.set_build_number(1);
        assert_eq!(fresh.render(), "1.0.0.Final-foo-1");
    }

    #[test]
    fn osgi_rendering_pads_and_sanitizes() {
        assert_eq!(VersionSpec::parse("1.2.GA-foo-1").render_osgi(), "1.2.0.GA-foo-1");
        assert_eq!(VersionSpec::parse("1.2.3.4").render_osgi(), "1.2.3.4");
        assert_eq!(VersionSpec::parse("1.2.3.4.5").render_osgi(), "1.2.3.4_5");
        assert_eq!(VersionSpec::parse("1.2").render_osgi(), "1.2");
        assert_eq!(VersionSpec::parse("1.2.foo+bar").render_osgi(), "1.2.0.foo_bar");
        assert_eq!(VersionSpec::parse("${v}-foo").render_osgi(), "${v}-foo");
    }

    #[test]
    fn highest_build_number_only_counts_matching_bases() {
        let base = VersionSpec::parse("1.2.GA-foo-1");
        let found = base.find_highest_matching_build_number([
            "1.2.GA-foo-3",
            "1.2.GA-foo-2",
            "1.2.GA-foo-9",
            "1.3.GA-foo-40",
            "1.2.GA-bar-50",
            "garbage [",
        ]);
        assert_eq!(found, 9);
    }

    #[test]
    fn highest_build_number_normalizes_core_and_separators() {
        let base = VersionSpec::parse("1.2.GA-foo");
        assert_eq!(
            base.find_highest_matching_build_number(["1.2.0.GA.foo-4"]),
            4
        );
        assert_eq!(base.find_highest_matching_build_number(Vec::<String>::new()), 0);
    }

    #[test]
    fn highest_build_number_skips_exhausted_candidates() {
        let base = VersionSpec::parse("1.0.redhat");
        let max = format!("1.0.redhat-{}", u64::MAX);
        assert_eq!(base.find_highest_matching_build_number([max.as_str()]), 0);
        assert_eq!(base.find_highest_matching_build_number([max.as_str(), "1.0.redhat-4"]), 4);
    }

    #[test]
    fn irrelevant_versions_are_ignored() {
        let mut spec = VersionSpec::parse("0.0.7");
        spec.append_qualifier_suffix("redhat-0");
        let found = spec.find_highest_matching_build_number([
            "0.0.1", "0.0.6", "0.0.7", "0.0.7.redhat-1",
        ]);
        assert_eq!(found, 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn version_strategy() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(0u32..200, 0..5),
            prop::option::of("[.\\-_]"),
            "[A-Za-z]{0,6}([.\\-][A-Za-z]{1,5}){0,2}",
            prop::option::of(("[.\\-]", 0u32..500)),
            any::<bool>(),
        )
            .prop_map(|(core, sep, qualifier, build, snapshot)| {
                let mut s = core
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(".");
                if !qualifier.is_empty() {
                    if let Some(sep) = sep {
                        s.push_str(&sep);
                    }
                    s.push_str(&qualifier);
                }
                if let Some((sep, n)) = build {
                    s.push_str(&sep);
                    s.push_str(&n.to_string());
                }
                if snapshot {
                    s.push_str("-SNAPSHOT");
                }
                s
            })
    }

    proptest! {
        #[test]
        fn unmodified_specs_round_trip(raw in version_strategy()) {
            prop_assert_eq!(VersionSpec::parse(&raw).render(), raw);
        }

        #[test]
        fn arbitrary_input_round_trips(raw in "\\PC{0,24}") {
            prop_assert_eq!(VersionSpec::parse(&raw).render(), raw);
        }

        #[test]
        fn appending_a_suffix_is_idempotent(
            raw in version_strategy(),
            label in "[a-z]{1,8}",
            build in prop::option::of(0u32..50),
        ) {
            let suffix = match build {
                Some(n) => format!("{label}-{n}"),
                None => label,
            };
            let mut once = VersionSpec::parse(&raw);
            once.append_qualifier_suffix(&suffix);
            let first = once.render();

            let mut twice = VersionSpec::parse(&first);
            twice.append_qualifier_suffix(&suffix);
            prop_assert_eq!(twice.render(), first);
        }

        #[test]
        fn osgi_form_has_at_most_four_segments(raw in version_strategy()) {
            let spec = VersionSpec::parse(&raw);
            prop_assume!(!spec.core().is_empty());
            let osgi = spec.render_osgi();
            prop_assert!(osgi.splitn(5, '.').count() <= 4);
        }
    }
}
