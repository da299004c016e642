//! Module re-versioning.
//!
//! - [`calculator`] : one-version [`calculate`] and the reactor-wide
//!   [`calculate_versioning_changes`].
//! - [`apply`] : writes the result back into the reactor.

pub mod apply;
pub mod calculator;

pub use apply::apply_versioning_changes;
pub use calculator::{
    NoCandidates, Suffix, VersionCandidates, VersionChanges, VersionPolicy, calculate,
    calculate_versioning_changes,
};

use crate::config::VersioningConfig;
use crate::model::Reactor;
use crate::report::Report;

/// The versioning stage: compute new module versions and apply them.
///
/// Does nothing when no override or suffix is configured. Returns the
/// number of edits made to the reactor.
pub fn run(
    reactor: &mut Reactor,
    config: &VersioningConfig,
    candidates: &dyn VersionCandidates,
    report: &mut Report,
) -> usize {
    let Some(policy) = config.policy() else {
        tracing::debug!("no versioning policy configured");
        return 0;
    };
    let changes = calculate_versioning_changes(reactor, &policy, config.osgi, candidates);
    let edits = apply_versioning_changes(reactor, &changes, report);
    tracing::info!(modules = changes.len(), edits, "re-versioned reactor");
    edits
}
