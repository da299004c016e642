use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use realign::config::RealignConfig;
use realign::model::Reactor;
use realign::rest;

/// Print the alignment-service request for a reactor
#[derive(Args, Debug)]
pub struct RestRequestArgs {
    /// Reactor snapshot (JSON: {"modules": [...]})
    #[arg(long)]
    pub reactor: PathBuf,

    /// Configuration file; `versioning.preserve_snapshot` is honored
    #[arg(long, env = "REALIGN_CONFIG", default_value = "realign.toml")]
    pub config: PathBuf,
}

pub fn run(args: &RestRequestArgs) -> Result<()> {
    let config = RealignConfig::load(&args.config)?;
    let text = fs::read_to_string(&args.reactor)
        .with_context(|| format!("Failed to read reactor snapshot {}", args.reactor.display()))?;
    let reactor: Reactor = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse reactor snapshot {}", args.reactor.display()))?;
    let request = rest::build_request(&reactor, config.versioning.preserve_snapshot);
    println!("{}", serde_json::to_string_pretty(&request).context("Failed to serialize request")?);
    Ok(())
}
