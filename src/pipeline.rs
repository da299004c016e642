//! One alignment pass over a reactor.
//!
//! Stages run in the order listed in `[pipeline] stages`, all against a
//! scratch copy of the reactor. The copy replaces the caller's reactor only
//! when every stage succeeded, so an aborted pass leaves nothing behind.

use std::collections::BTreeMap;

use crate::align::{self, DependencyStage, StrictPolicy};
use crate::config::{RealignConfig, StageKind};
use crate::error::AlignError;
use crate::model::Reactor;
use crate::overrides::{ExplicitOverrides, OverrideSources};
use crate::report::Report;
use crate::stages;
use crate::versioning::{self, NoCandidates, VersionCandidates};

/// Everything a pass consumes besides the reactor and the configuration.
pub struct AlignInputs<'a> {
    pub sources: OverrideSources,
    /// Published versions of the reactor's modules, for incremental
    /// suffixes.
    pub candidates: &'a dyn VersionCandidates,
    /// Remote property overrides for the `property-injection` stage.
    pub properties: BTreeMap<String, String>,
}

impl Default for AlignInputs<'_> {
    fn default() -> Self {
        Self::new(OverrideSources::default())
    }
}

impl<'a> AlignInputs<'a> {
    #[must_use]
    pub fn new(sources: OverrideSources) -> Self {
        Self {
            sources,
            candidates: &NoCandidates,
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_candidates(mut self, candidates: &'a dyn VersionCandidates) -> Self {
        self.candidates = candidates;
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }
}

/// Run every configured stage. On success `reactor` holds the aligned
/// modules and the report lists what changed.
///
/// # Errors
/// Returns the [`AlignError`] that aborted the pass; `reactor` is then
/// unchanged.
#[tracing::instrument(skip_all, fields(modules = reactor.len(), stages = config.pipeline.stages.len()))]
pub fn align(reactor: &mut Reactor, config: &RealignConfig, inputs: &AlignInputs<'_>) -> Result<Report, AlignError> {
    let strict = StrictPolicy::from_config(config)?;
    let explicit = ExplicitOverrides::parse(&config.alignment.overrides, &inputs.sources.extra)?;

    let mut scratch = reactor.clone();
    let mut report = Report::new();
    for &stage in &config.pipeline.stages {
        let _span = tracing::info_span!("stage", %stage).entered();
        let changed = match stage {
            StageKind::Versioning => {
                versioning::run(&mut scratch, &config.versioning, inputs.candidates, &mut report)
            }
            StageKind::Dependencies => {
                let dependencies = DependencyStage {
                    config: &config.alignment,
                    strict: &strict,
                    sources: &inputs.sources,
                    explicit: &explicit,
                };
                align::run(&mut scratch, &dependencies, &mut report)?
            }
            StageKind::PropertyInjection => stages::inject_properties(&mut scratch, &inputs.properties, &mut report),
            StageKind::PluginRemoval => stages::remove_plugins(&mut scratch, &config.removal, &mut report)?,
            StageKind::ProfileRemoval => stages::remove_profiles(&mut scratch, &config.removal, &mut report),
            StageKind::EnforceProjectVersion => {
                if config.alignment.enforce_project_version {
                    stages::enforce_project_version(&mut scratch, &mut report)
                } else {
                    0
                }
            }
        };
        tracing::debug!(changed, "stage finished");
    }

    *reactor = scratch;
    tracing::info!(
        changes = report.changes().len(),
        modules = report.changed_modules().len(),
        warnings = report.warnings().len(),
        "alignment pass complete"
    );
    Ok(report)
}
