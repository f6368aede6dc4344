//! # imprint-sync
//!
//! Digest-gated file reconciliation and generation orchestration.
//!
//! Call [`reconcile`] (or [`reconcile_blocking`]) to bring every destination
//! of a manifest in line with its captured content, [`pipeline::generate`]
//! to materialize a standalone program, or [`diff_manifest`] to preview
//! changes without touching the filesystem.

pub mod diff;
pub mod driver;
pub mod error;
pub mod pipeline;
pub mod writer;

pub use diff::{diff_manifest, FileDiff};
pub use driver::{reconcile, reconcile_blocking, EntryReport, ReconcileOptions, ReconcileReport};
pub use error::SyncError;
pub use writer::{digest_file, reconcile_entry, reconcile_file, WriteResult};
