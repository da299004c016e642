//! Reactor data model: modules, declarations, and interpolation.

pub mod interpolate;
pub mod reactor;
pub mod types;

pub use reactor::Reactor;
pub use types::{
    DEFAULT_PLUGIN_GROUP, Declaration, DeclarationPath, Dependency, ModelBase, Module, ModuleId,
    POM_PACKAGING, ParentDecl, Plugin, Profile, Scope, Section,
};
