use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use realign::config::RealignConfig;
use realign::model::Reactor;
use realign::overrides::{OverrideMap, OverrideSnapshot, OverrideSource, OverrideSources};
use realign::pipeline::{AlignInputs, align};
use realign::rest;
use realign_version::ProjectRef;
use serde::de::DeserializeOwned;

use crate::format::OutputFormat;

/// Align a reactor snapshot against override sources
#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Reactor snapshot (JSON: {"modules": [...]})
    #[arg(long)]
    pub reactor: PathBuf,

    /// BOM overrides (JSON object "g:a" -> version, or list of coordinates)
    #[arg(long)]
    pub bom: Option<PathBuf>,

    /// Alignment service response body (JSON list with bestMatchVersion)
    #[arg(long)]
    pub rest: Option<PathBuf>,

    /// Named extra BOM for `bom:<name>` overrides
    #[arg(long = "extra-bom", value_name = "NAME=PATH", value_parser = parse_named)]
    pub extra_bom: Vec<(String, PathBuf)>,

    /// Published module versions (JSON object "g:a" -> [versions])
    #[arg(long)]
    pub candidates: Option<PathBuf>,

    /// Remote property overrides (JSON object name -> value)
    #[arg(long)]
    pub properties: Option<PathBuf>,

    /// Configuration file (missing file means defaults)
    #[arg(long, env = "REALIGN_CONFIG", default_value = "realign.toml")]
    pub config: PathBuf,

    /// Report format: text or json
    #[arg(long, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the aligned reactor here (JSON)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

fn parse_named(s: &str) -> Result<(String, PathBuf)> {
    match s.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_owned(), PathBuf::from(path.trim())))
        }
        _ => bail!("expected NAME=PATH, got '{s}'"),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {what} {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {what} {}", path.display()))
}

fn read_overrides(path: &Path, source: &OverrideSource) -> Result<OverrideMap> {
    let snapshot: OverrideSnapshot = read_json(path, "override file")?;
    OverrideMap::from_snapshot(source, snapshot).with_context(|| format!("Invalid overrides in {}", path.display()))
}

fn read_candidates(path: &Path) -> Result<BTreeMap<ProjectRef, BTreeSet<String>>> {
    let raw: BTreeMap<String, Vec<String>> = read_json(path, "candidate file")?;
    raw.into_iter()
        .map(|(ga, versions)| {
            let ga = ProjectRef::parse(&ga).with_context(|| format!("Invalid GA '{ga}' in {}", path.display()))?;
            Ok((ga, versions.into_iter().collect()))
        })
        .collect()
}

pub fn run(args: &AlignArgs) -> Result<()> {
    let config = RealignConfig::load(&args.config)?;
    let mut reactor: Reactor = read_json(&args.reactor, "reactor snapshot")?;

    let mut sources = OverrideSources::default();
    if let Some(path) = &args.bom {
        sources.bom = read_overrides(path, &OverrideSource::Bom)?;
    }
    for (name, path) in &args.extra_bom {
        let map = read_overrides(path, &OverrideSource::Extra(name.clone()))?;
        sources.extra.insert(name.clone(), map);
    }

    let mut candidates = match &args.candidates {
        Some(path) => read_candidates(path)?,
        None => BTreeMap::new(),
    };
    if let Some(path) = &args.rest {
        let body = fs::read_to_string(path).with_context(|| format!("Failed to read REST response {}", path.display()))?;
        let matches = rest::parse_response(&body)?;
        sources.rest = rest::rest_overrides(&matches, &reactor);
        for (ga, versions) in rest::rest_candidates(&matches, &reactor) {
            candidates.entry(ga).or_default().extend(versions);
        }
    }
    let properties: BTreeMap<String, String> = match &args.properties {
        Some(path) => read_json(path, "property file")?,
        None => BTreeMap::new(),
    };

    let inputs = AlignInputs::new(sources)
        .with_candidates(&candidates)
        .with_properties(properties);
    let report = align(&mut reactor, &config, &inputs)?;

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&reactor).context("Failed to serialize reactor")?;
        fs::write(path, json + "\n").with_context(|| format!("Failed to write {}", path.display()))?;
    }
    print!("{}", args.format.render(&report)?);
    if args.format == OutputFormat::Json {
        println!();
    }
    Ok(())
}
