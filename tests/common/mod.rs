//! Shared helpers for realign integration tests.
//!
//! Reactors are built from JSON snapshots, the same form the CLI reads.
//! CLI tests run the real binary inside a temp directory.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

use realign::config::{Precedence, RealignConfig};
use realign::model::Reactor;
use realign::overrides::{OverrideMap, OverrideSource, OverrideSources};
use realign_version::Coordinate;

/// Parse a reactor snapshot.
pub fn reactor(json: &str) -> Reactor {
    serde_json::from_str(json).expect("reactor snapshot should parse")
}

/// BOM-only override sources from `g:a[:t[:c]]:v` strings.
pub fn bom(entries: &[&str]) -> OverrideSources {
    OverrideSources {
        bom: overrides(OverrideSource::Bom, entries),
        ..OverrideSources::default()
    }
}

pub fn overrides(source: OverrideSource, entries: &[&str]) -> OverrideMap {
    OverrideMap::from_coordinates(
        &source,
        entries
            .iter()
            .map(|s| Coordinate::parse(s).expect("valid coordinate")),
    )
}

/// Parse a config and force BOM precedence.
pub fn bom_config(toml: &str) -> RealignConfig {
    let mut config = RealignConfig::parse(toml).expect("config should parse");
    config.alignment.precedence = Precedence::Bom;
    config
}

/// Run the realign binary in `dir`.
pub fn realign_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_realign"))
        .args(args)
        .current_dir(dir)
        .env("REALIGN_LOG", "warn")
        .output()
        .expect("failed to run realign")
}

/// Run realign, assert success, return stdout.
pub fn realign_ok(dir: &Path, args: &[&str]) -> String {
    let out = realign_in(dir, args);
    assert!(
        out.status.success(),
        "realign {} failed:\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).to_string()
}

/// A parent pom plus two children sharing `${foo.version}`.
pub const SHARED_PROPERTY_REACTOR: &str = r#"{"modules": [
    {"groupId": "org.app", "artifactId": "parent", "version": "1.0", "packaging": "pom",
     "properties": {"foo.version": "1.0"},
     "managedDependencies": [
        {"groupId": "org.x", "artifactId": "x", "version": "${foo.version}"},
        {"groupId": "org.y", "artifactId": "y", "version": "${foo.version}"}
     ]},
    {"artifactId": "core", "parentModule": 0,
     "parent": {"groupId": "org.app", "artifactId": "parent", "version": "1.0"},
     "dependencies": [
        {"groupId": "org.x", "artifactId": "x"},
        {"groupId": "org.b", "artifactId": "tool", "version": "1.2"}
     ]}
]}"#;
