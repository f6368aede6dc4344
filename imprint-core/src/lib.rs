//! Imprint core library — manifest model, path normalization, tree capture.
//!
//! Public API surface:
//! - [`normalize`] — relative path → identifier
//! - [`types`] — [`Manifest`], [`ManifestEntry`], [`ContentDigest`], [`EmbeddedFile`]
//! - [`manifest`] — [`ManifestBuilder`] directory walk
//! - [`config`] — optional `imprint.yaml`
//! - [`error`] — [`ManifestError`]

pub mod config;
pub mod error;
pub mod manifest;
pub mod normalize;
pub mod types;

pub use config::ImprintConfig;
pub use error::ManifestError;
pub use manifest::ManifestBuilder;
pub use normalize::normalize;
pub use types::{ContentDigest, EmbeddedFile, Identifier, Manifest, ManifestEntry};
