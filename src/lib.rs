//! realign library crate.
//!
//! The primary interface is the `realign` binary. This lib.rs exposes the
//! alignment engine so that build integrations and integration tests can
//! drive a pass directly: load a [`config::RealignConfig`], build a
//! [`model::Reactor`], collect [`overrides::OverrideSources`], then call
//! [`pipeline::align`].

pub mod align;
pub mod config;
pub mod error;
pub mod model;
pub mod overrides;
pub mod pipeline;
pub mod report;
pub mod rest;
pub mod stages;
pub mod telemetry;
pub mod versioning;

pub use error::AlignError;
pub use pipeline::{AlignInputs, align};
pub use report::Report;
