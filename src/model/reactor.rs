//! The reactor: every module taking part in one alignment pass.
//!
//! Modules live in a `Vec` and refer to their in-reactor parent by
//! [`ModuleId`]. The tree is validated once on construction (indices in
//! range, no inheritance cycles) so traversal never has to.

use std::collections::BTreeSet;

use realign_version::ProjectRef;
use serde::{Deserialize, Serialize};

use super::interpolate;
use super::types::{Module, ModuleId};
use crate::error::AlignError;

/// An index-addressed module tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReactorSnapshot", into = "ReactorSnapshot")]
pub struct Reactor {
    modules: Vec<Module>,
}

/// Wire form of a [`Reactor`]: `{"modules": [...]}`.
#[derive(Serialize, Deserialize)]
struct ReactorSnapshot {
    modules: Vec<Module>,
}

impl TryFrom<ReactorSnapshot> for Reactor {
    type Error = AlignError;
    fn try_from(snapshot: ReactorSnapshot) -> Result<Self, Self::Error> {
        Self::new(snapshot.modules)
    }
}

impl From<Reactor> for ReactorSnapshot {
    fn from(reactor: Reactor) -> Self {
        Self {
            modules: reactor.modules,
        }
    }
}

impl Reactor {
    /// Build a reactor, validating the parent links.
    ///
    /// The first module is the execution root.
    ///
    /// # Errors
    /// Returns [`AlignError::InvalidReactor`] if the list is empty, a parent
    /// index is out of range, or the parent links form a cycle.
    pub fn new(modules: Vec<Module>) -> Result<Self, AlignError> {
        if modules.is_empty() {
            return Err(AlignError::InvalidReactor {
                reason: "no modules".to_owned(),
            });
        }
        for (i, module) in modules.iter().enumerate() {
            if let Some(parent) = module.parent_module
                && parent.0 >= modules.len()
            {
                return Err(AlignError::InvalidReactor {
                    reason: format!(
                        "module {} ({}) has parent index {} but the reactor has {} modules",
                        ModuleId(i),
                        module.artifact_id,
                        parent.0,
                        modules.len()
                    ),
                });
            }
        }
        for start in 0..modules.len() {
            let mut current = modules[start].parent_module;
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if id.0 == start || steps > modules.len() {
                    return Err(AlignError::InvalidReactor {
                        reason: format!(
                            "inheritance cycle through module {} ({})",
                            ModuleId(start),
                            modules[start].artifact_id
                        ),
                    });
                }
                current = modules[id.0].parent_module;
            }
        }
        Ok(Self { modules })
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ModuleId> + use<> {
        (0..self.modules.len()).map(ModuleId)
    }

    /// The module at `id`. Ids are only ever produced by this reactor.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    #[must_use]
    pub fn parent(&self, id: ModuleId) -> Option<ModuleId> {
        self.module(id).parent_module
    }

    /// `id` followed by its in-reactor ancestors, nearest first.
    #[must_use]
    pub fn chain(&self, id: ModuleId) -> Vec<ModuleId> {
        let mut out = vec![id];
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// The topmost in-reactor ancestor of `id` (possibly `id` itself).
    #[must_use]
    pub fn inheritance_root(&self, id: ModuleId) -> ModuleId {
        let mut current = id;
        while let Some(p) = self.parent(current) {
            current = p;
        }
        current
    }

    #[must_use]
    pub fn is_inheritance_root(&self, id: ModuleId) -> bool {
        self.parent(id).is_none()
    }

    /// The module the build was started from.
    #[must_use]
    pub const fn execution_root(&self) -> ModuleId {
        ModuleId(0)
    }

    /// Visit order: inheritance roots first, then children by depth, keeping
    /// reactor order within a depth.
    #[must_use]
    pub fn order(&self) -> Vec<ModuleId> {
        let mut ids: Vec<(usize, ModuleId)> =
            self.ids().map(|id| (self.chain(id).len(), id)).collect();
        ids.sort_by_key(|&(depth, id)| (depth, id));
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Interpolated `group:artifact` of a module.
    #[must_use]
    pub fn project_ref(&self, id: ModuleId) -> ProjectRef {
        let module = self.module(id);
        let group = module
            .raw_group_id()
            .map(|g| interpolate::resolve(self, id, g))
            .unwrap_or_default();
        let artifact = interpolate::resolve(self, id, &module.artifact_id);
        ProjectRef::new(group, artifact)
    }

    /// Interpolated version of a module, own or inherited.
    #[must_use]
    pub fn version(&self, id: ModuleId) -> Option<String> {
        self.module(id)
            .raw_version()
            .map(|v| interpolate::resolve(self, id, v))
    }

    /// The GAs of every module in the reactor.
    #[must_use]
    pub fn project_refs(&self) -> BTreeSet<ProjectRef> {
        self.ids().map(|id| self.project_ref(id)).collect()
    }
}
