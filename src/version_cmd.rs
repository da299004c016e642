use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use realign::versioning::{Suffix, VersionPolicy, calculate};
use realign_version::ProjectRef;

/// Compute the rebuilt form of one version
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// The original version
    #[arg(value_name = "VERSION")]
    pub original: String,

    /// Static suffix, e.g. redhat-1
    #[arg(long, conflicts_with = "incremental")]
    pub suffix: Option<String>,

    /// Incremental suffix label, e.g. redhat
    #[arg(long)]
    pub incremental: Option<String>,

    /// Replace the version before suffixing
    #[arg(long = "override")]
    pub override_version: Option<String>,

    /// Already-published version, for incremental build numbers (repeatable)
    #[arg(long = "candidate", value_name = "VERSION")]
    pub candidates: Vec<String>,

    /// Keep -SNAPSHOT on the result
    #[arg(long)]
    pub preserve_snapshot: bool,

    /// Render in OSGi form
    #[arg(long)]
    pub osgi: bool,
}

impl VersionArgs {
    fn policy(&self) -> VersionPolicy {
        let suffix = match (&self.suffix, &self.incremental) {
            (Some(s), _) => Suffix::Static(s.clone()),
            (None, Some(s)) => Suffix::Incremental(s.clone()),
            (None, None) => Suffix::None,
        };
        VersionPolicy {
            override_version: self.override_version.clone(),
            suffix,
            preserve_snapshot: self.preserve_snapshot,
        }
    }

    /// The computed version string.
    fn compute(&self) -> String {
        let ga = ProjectRef::new("", "");
        let candidates = BTreeMap::from([(ga.clone(), self.candidates.clone())]);
        calculate(&ga, &self.original, &self.policy(), &candidates).render_with(self.osgi)
    }
}

pub fn run(args: &VersionArgs) -> Result<()> {
    println!("{}", args.compute());
    Ok(())
}
