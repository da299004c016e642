//! `${...}` interpolation in the context of a reactor module.
//!
//! Built-in project references are answered from the module itself; every
//! other name is looked up as a property from the module up through its
//! in-reactor ancestors. Resolution is recursive with a depth bound, and
//! anything that cannot be resolved is left in place verbatim.

use super::reactor::Reactor;
use super::types::{ModuleId, Scope};

const MAX_DEPTH: usize = 16;

/// Where a property is declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyLocation {
    pub module: ModuleId,
    pub scope: Scope,
    pub name: String,
    pub value: String,
}

/// If `raw` is exactly one `${name}` reference, return `name`.
#[must_use]
pub fn property_reference(raw: &str) -> Option<&str> {
    let inner = raw.strip_prefix("${")?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains("${") || inner.contains('}') {
        return None;
    }
    Some(inner)
}

/// Returns `true` if `raw` contains any `${` reference.
#[must_use]
pub fn has_reference(raw: &str) -> bool {
    raw.contains("${")
}

/// Names answered from the module model rather than from properties.
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "project.version"
            | "project.groupId"
            | "project.artifactId"
            | "project.parent.version"
            | "project.parent.groupId"
            | "parent.version"
            | "pom.version"
            | "version"
    )
}

/// Fully interpolate `raw` in the context of module `id`.
#[must_use]
pub fn resolve(reactor: &Reactor, id: ModuleId, raw: &str) -> String {
    resolve_depth(reactor, id, raw, 0)
}

fn resolve_depth(reactor: &Reactor, id: ModuleId, raw: &str, depth: usize) -> String {
    if depth > MAX_DEPTH || !has_reference(raw) {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match lookup(reactor, id, name) {
            Some(value) => out.push_str(&resolve_depth(reactor, id, &value, depth + 1)),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Raw (uninterpolated) value of `name` for module `id`.
#[must_use]
pub fn lookup(reactor: &Reactor, id: ModuleId, name: &str) -> Option<String> {
    let module = reactor.module(id);
    match name {
        "project.version" | "pom.version" | "version" => module.raw_version().map(str::to_owned),
        "project.groupId" => module.raw_group_id().map(str::to_owned),
        "project.artifactId" => Some(module.artifact_id.clone()),
        "project.parent.version" | "parent.version" => {
            module.parent.as_ref().map(|p| p.version.clone())
        }
        "project.parent.groupId" => module.parent.as_ref().map(|p| p.group_id.clone()),
        _ => reactor
            .chain(id)
            .into_iter()
            .find_map(|m| reactor.module(m).own_property(name).map(|(_, v)| v.to_owned())),
    }
}

/// Returns `true` if `raw` is a single reference whose alias chain lands on
/// the version of module `id` itself.
///
/// `${project.parent.version}` only counts when the module inherits its
/// version from the parent.
#[must_use]
pub fn follows_project_version(reactor: &Reactor, id: ModuleId, raw: &str) -> bool {
    let inherits = reactor.module(id).version.is_none();
    let mut current = raw.to_owned();
    for _ in 0..MAX_DEPTH {
        let Some(name) = property_reference(&current) else {
            return false;
        };
        match name {
            "project.version" | "pom.version" | "version" => return true,
            "project.parent.version" | "parent.version" => return inherits,
            _ if is_builtin(name) => return false,
            _ => {}
        }
        let Some(next) = lookup(reactor, id, name) else {
            return false;
        };
        current = next;
    }
    false
}

/// The nearest declaration of property `name` visible from module `id`.
///
/// When the declared value is itself a single `${other}` reference to a
/// property that is also declared, the alias is followed and the location
/// of `other` is returned.
#[must_use]
pub fn locate_property(reactor: &Reactor, id: ModuleId, name: &str) -> Option<PropertyLocation> {
    let mut current = find_declaration(reactor, id, name)?;
    for _ in 0..MAX_DEPTH {
        let next = match property_reference(&current.value) {
            Some(alias) if !is_builtin(alias) => find_declaration(reactor, id, alias),
            _ => None,
        };
        match next {
            Some(next) if next != current => current = next,
            _ => break,
        }
    }
    Some(current)
}

fn find_declaration(reactor: &Reactor, id: ModuleId, name: &str) -> Option<PropertyLocation> {
    reactor.chain(id).into_iter().find_map(|m| {
        reactor
            .module(m)
            .own_property(name)
            .map(|(scope, value)| PropertyLocation {
                module: m,
                scope,
                name: name.to_owned(),
                value: value.to_owned(),
            })
    })
}
