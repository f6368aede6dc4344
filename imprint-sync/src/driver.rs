//! Concurrent reconciliation driver.
//!
//! Launches one blocking task per manifest entry, in manifest order, and
//! waits for every one of them before returning. Units share no mutable
//! state; each owns exactly one destination.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;

use imprint_core::{Identifier, Manifest};

use crate::error::SyncError;
use crate::writer::{reconcile_entry, WriteResult};

/// Driver knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Report what would change without touching the filesystem.
    pub dry_run: bool,
    /// Upper bound on units in flight. `None` (or zero) means unbounded.
    pub max_concurrency: Option<usize>,
}

/// Result of one reconciliation unit.
#[derive(Debug)]
pub struct EntryReport {
    pub identifier: Identifier,
    pub destination: PathBuf,
    pub result: Result<WriteResult, SyncError>,
}

/// Per-entry results in manifest order.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub entries: Vec<EntryReport>,
}

impl ReconcileReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn written(&self) -> usize {
        self.count(|r| matches!(r, WriteResult::Written { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|r| matches!(r, WriteResult::Unchanged { .. }))
    }

    pub fn would_write(&self) -> usize {
        self.count(|r| matches!(r, WriteResult::WouldWrite { .. }))
    }

    /// Entries whose unit failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&EntryReport, &SyncError)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.result.as_ref().err().map(|err| (entry, err)))
    }

    pub fn is_success(&self) -> bool {
        self.entries.iter().all(|entry| entry.result.is_ok())
    }

    fn count(&self, pred: impl Fn(&WriteResult) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.result.as_ref().is_ok_and(&pred))
            .count()
    }
}

/// Reconcile every entry of `manifest` into `base`.
///
/// Never short-circuits: a failing unit is recorded and the remaining units
/// still run to completion.
pub async fn reconcile(
    manifest: Arc<Manifest>,
    base: PathBuf,
    options: ReconcileOptions,
) -> ReconcileReport {
    let limit = options
        .max_concurrency
        .filter(|n| *n > 0)
        .map(|n| Arc::new(Semaphore::new(n)));
    let base = Arc::new(base);

    let mut handles = Vec::with_capacity(manifest.len());
    for index in 0..manifest.len() {
        let permit = match &limit {
            Some(sem) => Arc::clone(sem).acquire_owned().await.ok(),
            None => None,
        };
        let manifest = Arc::clone(&manifest);
        let base = Arc::clone(&base);
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            reconcile_entry(&manifest.entries()[index], &base, options.dry_run)
        }));
    }

    let mut entries = Vec::with_capacity(handles.len());
    for (entry, handle) in manifest.iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => Err(SyncError::TaskJoin {
                identifier: entry.identifier().to_string(),
                message: err.to_string(),
            }),
        };
        let destination = entry.destination(&base);
        if let Err(err) = &result {
            tracing::error!("failed: {}: {err}", destination.display());
        }
        entries.push(EntryReport {
            identifier: entry.identifier().clone(),
            destination,
            result,
        });
    }
    debug_assert_eq!(entries.len(), manifest.len());

    let report = ReconcileReport { entries };
    tracing::info!(
        "reconciled {} file(s) into {}: {} written, {} unchanged, {} failed",
        report.len(),
        base.display(),
        report.written(),
        report.unchanged(),
        report.failures().count()
    );
    report
}

/// Run [`reconcile`] on a fresh multi-thread runtime and block until done.
pub fn reconcile_blocking(
    manifest: Arc<Manifest>,
    base: &Path,
    options: ReconcileOptions,
) -> Result<ReconcileReport, SyncError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SyncError::Runtime)?;
    Ok(runtime.block_on(reconcile(manifest, base.to_path_buf(), options)))
}
