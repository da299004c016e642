//! Alignment-service payloads.
//!
//! Only the mapping lives here: building the request body from a reactor and
//! reading the response into overrides and incremental-suffix candidates.
//! Talking to the service is left to the caller.

use std::collections::{BTreeMap, BTreeSet};

use realign_version::{ProjectRef, VersionSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Reactor, interpolate};
use crate::overrides::{OverrideMap, OverrideSource};

/// One GAV of a request (and the echo of it in a response).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestGav {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl RestGav {
    #[must_use]
    pub fn project_ref(&self) -> ProjectRef {
        ProjectRef::new(&self.group_id, &self.artifact_id)
    }
}

/// A requested GAV together with the service's answer for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestMatch {
    pub request: RestGav,
    pub best_match: String,
    /// Other versions of the GA the service knows about.
    pub available: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseEntry {
    #[serde(flatten)]
    gav: RestGav,
    #[serde(default)]
    best_match_version: Option<String>,
    #[serde(default)]
    available_versions: Vec<String>,
}

/// The response body could not be used.
#[derive(Debug, Error)]
pub enum RestError {
    #[error(
        "alignment service response is not a list of GAV objects: {source}.\n  To fix: check the service URL and that it answers with JSON"
    )]
    Malformed {
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Every module GAV and every versioned dependency GAV of the reactor,
/// interpolated, de-duplicated and sorted. `-SNAPSHOT` is stripped unless
/// `preserve_snapshot`.
#[must_use]
#[tracing::instrument(skip_all, fields(modules = reactor.len()))]
pub fn build_request(reactor: &Reactor, preserve_snapshot: bool) -> Vec<RestGav> {
    let strip = |version: &str| {
        if preserve_snapshot {
            return version.to_owned();
        }
        let mut spec = VersionSpec::parse(version);
        spec.set_snapshot(false);
        spec.render()
    };

    let mut gavs = BTreeSet::new();
    for id in reactor.ids() {
        let ga = reactor.project_ref(id);
        if let Some(version) = reactor.version(id) {
            gavs.insert(RestGav {
                group_id: ga.group_id().to_owned(),
                artifact_id: ga.artifact_id().to_owned(),
                version: strip(&version),
            });
        }
        for decl in reactor.module(id).dependency_declarations() {
            let Some(raw) = decl.version.as_deref() else {
                continue;
            };
            let version = interpolate::resolve(reactor, id, raw);
            if version.is_empty() || interpolate::has_reference(&version) {
                tracing::debug!(module = %ga, artifact = %decl.artifact_id, version = raw, "unresolved version left out of the request");
                continue;
            }
            gavs.insert(RestGav {
                group_id: interpolate::resolve(reactor, id, &decl.group_id),
                artifact_id: interpolate::resolve(reactor, id, &decl.artifact_id),
                version: strip(&version),
            });
        }
    }
    tracing::debug!(gavs = gavs.len(), "built alignment request");
    gavs.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Read a response body.
///
/// An empty body, an HTML page, or a `{"message": ...}` object is logged as
/// an error and yields no matches. Entries without `bestMatchVersion` are
/// dropped.
///
/// # Errors
/// Returns [`RestError::Malformed`] for anything else that is not a JSON list
/// of GAV objects.
pub fn parse_response(body: &str) -> Result<Vec<RestMatch>, RestError> {
    let body = body.trim();
    if body.is_empty() {
        tracing::error!("alignment service returned no content");
        return Ok(Vec::new());
    }
    if body.starts_with('<') {
        tracing::error!(body, "alignment service returned HTML rather than JSON");
        return Ok(Vec::new());
    }
    if body.starts_with('{')
        && let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(message) = map.get("message")
    {
        tracing::error!(%message, "alignment service returned a message instead of matches");
        return Ok(Vec::new());
    }

    let entries: Vec<ResponseEntry> =
        serde_json::from_str(body).map_err(|source| RestError::Malformed { source })?;
    let total = entries.len();
    let matches: Vec<RestMatch> = entries
        .into_iter()
        .filter_map(|e| {
            Some(RestMatch {
                best_match: e.best_match_version.filter(|v| !v.trim().is_empty())?,
                request: e.gav,
                available: e.available_versions,
            })
        })
        .collect();
    tracing::info!(total, matched = matches.len(), "read alignment response");
    Ok(matches)
}

/// REST overrides (GA → best match) for everything that is not a reactor
/// module.
#[must_use]
pub fn rest_overrides(matches: &[RestMatch], reactor: &Reactor) -> OverrideMap {
    let local = reactor.project_refs();
    OverrideMap::from_coordinates(
        &OverrideSource::Rest,
        matches
            .iter()
            .filter(|m| !local.contains(&m.request.project_ref()))
            .map(|m| m.request.project_ref().with_version(m.best_match.clone())),
    )
}

/// Versions the service reports for the reactor's own modules, for use as
/// incremental-suffix candidates.
#[must_use]
pub fn rest_candidates(matches: &[RestMatch], reactor: &Reactor) -> BTreeMap<ProjectRef, BTreeSet<String>> {
    let local = reactor.project_refs();
    let mut out: BTreeMap<ProjectRef, BTreeSet<String>> = BTreeMap::new();
    for m in matches {
        let ga = m.request.project_ref();
        if !local.contains(&ga) {
            continue;
        }
        let versions = out.entry(ga).or_default();
        versions.insert(m.best_match.clone());
        versions.extend(m.available.iter().cloned());
    }
    out
}
