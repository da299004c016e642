//! Version strings and artifact identities for realign.
//!
//! Everything the alignment engine knows about a version goes through
//! [`VersionSpec`]: lenient parsing, exact re-rendering, qualifier suffixing,
//! build numbers and OSGi-compatible output. Artifact identities live in
//! [`ident`].
//!
//! # Crate layout
//!
//! - [`version`] : the [`VersionSpec`] model.
//! - [`ident`] : [`ProjectRef`] (`group:artifact`) and [`Coordinate`].
//! - [`error`] : the [`IdentError`] enum for rejected coordinates.

pub mod error;
pub mod ident;
pub mod version;

pub use error::IdentError;
pub use ident::{Coordinate, DEFAULT_TYPE, ProjectRef};
pub use version::{SNAPSHOT, VersionSpec};
