//! End-to-end checks of the core alignment guarantees through the public
//! library API.

mod common;
use common::*;

use std::collections::BTreeMap;

use realign::align::{Outcome, SkipReason};
use realign::config::Precedence;
use realign::model::{ModuleId, Reactor};
use realign::overrides::{OverrideSource, OverrideSources, merge};
use realign::report::{Report, WarningKind};
use realign::versioning::{
    NoCandidates, Suffix, VersionPolicy, calculate, calculate_versioning_changes,
};
use realign::{AlignInputs, align};
use realign_version::ProjectRef;

fn ga() -> ProjectRef {
    ProjectRef::new("org.app", "app")
}

fn fixed(suffix: &str) -> VersionPolicy {
    VersionPolicy {
        suffix: Suffix::Static(suffix.to_owned()),
        ..VersionPolicy::default()
    }
}

fn incremental(suffix: &str) -> VersionPolicy {
    VersionPolicy {
        suffix: Suffix::Incremental(suffix.to_owned()),
        ..VersionPolicy::default()
    }
}

#[test]
fn static_suffix_does_not_compound() {
    let once = calculate(&ga(), "1.2", &fixed("foo"), &NoCandidates).render();
    assert_eq!(once, "1.2.foo");
    let twice = calculate(&ga(), &once, &fixed("foo"), &NoCandidates).render();
    assert_eq!(twice, "1.2.foo");
}

#[test]
fn separator_follows_the_tail() {
    assert_eq!(calculate(&ga(), "1.2.GA", &fixed("foo"), &NoCandidates).render(), "1.2.GA-foo");
    assert_eq!(calculate(&ga(), "1.2", &fixed("foo"), &NoCandidates).render(), "1.2.foo");
}

#[test]
fn incremental_build_number_follows_highest_candidate() {
    let candidates = BTreeMap::from([(
        ga(),
        vec!["1.2.GA-foo-3".to_owned(), "1.2.GA-foo-2".to_owned(), "1.2.GA-foo-9".to_owned()],
    )]);
    let spec = calculate(&ga(), "1.2.GA-foo-1", &incremental("foo"), &candidates);
    assert_eq!(spec.build_number(), Some(10));
    assert_eq!(spec.render(), "1.2.GA-foo-10");
}

#[test]
fn reactor_modules_converge_on_one_version() {
    let reactor = reactor(
        r#"{"modules": [
            {"groupId": "org.app", "artifactId": "parent", "version": "1.2.GA-foo-1", "packaging": "pom"},
            {"groupId": "org.app", "artifactId": "child", "version": "1.2.GA-foo-1", "parentModule": 0,
             "parent": {"groupId": "org.app", "artifactId": "parent", "version": "1.2.GA-foo-1"}}
        ]}"#,
    );
    let candidates = BTreeMap::from([(
        ProjectRef::new("org.app", "child"),
        vec!["1.2.GA-foo-3".to_owned(), "1.2.GA-foo-2".to_owned(), "1.2.GA-foo-9".to_owned()],
    )]);
    let changes = calculate_versioning_changes(&reactor, &incremental("foo"), false, &candidates);
    let versions: Vec<&str> = changes.values().map(String::as_str).collect();
    assert_eq!(versions, ["1.2.GA-foo-10", "1.2.GA-foo-10"]);
}

#[test]
fn higher_precedence_source_replaces_whole_ga() {
    let sources = OverrideSources {
        bom: overrides(OverrideSource::Bom, &["org.a:lib:1.0", "org.a:lib:pom:1.0", "org.b:other:3.0"]),
        rest: overrides(OverrideSource::Rest, &["org.a:lib:2.0"]),
        ..OverrideSources::default()
    };
    let merged = merge(&sources, Precedence::RestThenBom, &mut Report::new());
    let lib: Vec<&str> = merged
        .for_ga(&ProjectRef::new("org.a", "lib"))
        .map(|e| e.version())
        .collect();
    assert_eq!(lib, ["2.0"]);
    assert!(merged.iter().all(|e| e.version() != "1.0"));
    assert_eq!(merged.len(), 2);
}

#[test]
fn first_property_demand_wins_and_later_one_is_rejected() {
    let mut r = reactor(SHARED_PROPERTY_REACTOR);
    let inputs = AlignInputs::new(bom(&["org.x:x:1.0.redhat-1", "org.y:y:1.0.redhat-2"]));
    let report = align(&mut r, &bom_config(""), &inputs).unwrap();

    assert_eq!(r.module(ModuleId(0)).base.properties["foo.version"], "1.0.redhat-1");
    assert_eq!(report.outcome_count(Outcome::PropertyRejected), 1);
    assert!(report.has_warnings(WarningKind::PropertyClash));
    let clash = report
        .warnings()
        .iter()
        .find(|w| w.kind == WarningKind::PropertyClash)
        .unwrap();
    assert!(clash.message.contains("org.y:y"), "{}", clash.message);
}

#[test]
fn strict_violation_skips_the_override() {
    let mut r: Reactor = reactor(
        r#"{"modules": [
            {"groupId": "org.app", "artifactId": "app", "version": "1.0",
             "dependencies": [{"groupId": "org.a", "artifactId": "lib", "version": "1.2"}]}
        ]}"#,
    );
    let config = bom_config(
        "[alignment.strict]\nenabled = true\nfail_on_violation = false\nrebuild_suffix = \"redhat\"\n",
    );
    let inputs = AlignInputs::new(bom(&["org.a:lib:2.0.redhat-1"]));
    let report = align(&mut r, &config, &inputs).unwrap();

    assert_eq!(r.module(ModuleId(0)).base.dependencies[0].version.as_deref(), Some("1.2"));
    assert_eq!(report.outcome_count(Outcome::Skipped(SkipReason::StrictViolation)), 1);
    assert!(report.has_warnings(WarningKind::StrictViolation));
    assert!(report.changes().is_empty());
}
