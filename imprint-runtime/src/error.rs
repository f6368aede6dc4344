use std::ffi::OsString;

use thiserror::Error;

/// Setup failures that stop a generated program before any file is touched.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("cannot resolve base directory: {0} is unset and no home directory was found")]
    BaseDirNotFound(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    InvalidSetting { name: &'static str, value: OsString },

    #[error("embedded manifest is invalid: {0}")]
    Manifest(#[from] imprint_core::ManifestError),

    #[error("sync error: {0}")]
    Sync(#[from] imprint_sync::SyncError),
}
